//! Scheduler implementation

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};

use meshbridge_protocol::messages::PUBLISH_FRAME_SIZE;
use meshbridge_protocol::Message;

use super::{LinkMode, SchedulerStats, StepOutcome, StepReport};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::link::LinkControl;
use crate::queue::EventQueue;
use crate::ring::TxBuffer;

/// Moves events from the queue to the transmit buffer, one per period
pub struct Scheduler<'a, M, L, const Q: usize, const T: usize>
where
    M: RawMutex,
    L: LinkControl,
{
    queue: &'a EventQueue<M, Q>,
    tx: &'a TxBuffer<M, T>,
    link: L,
    period: Duration,
    dequeue_timeout: Duration,
    mode: LinkMode,
    stats: SchedulerStats,
}

impl<'a, M, L, const Q: usize, const T: usize> Scheduler<'a, M, L, Q, T>
where
    M: RawMutex,
    L: LinkControl,
{
    pub fn new(
        queue: &'a EventQueue<M, Q>,
        tx: &'a TxBuffer<M, T>,
        link: L,
        config: &BridgeConfig,
    ) -> Self {
        Self {
            queue,
            tx,
            link,
            period: config.period(),
            dequeue_timeout: config.dequeue_timeout(),
            mode: LinkMode::LinkAbsent,
            stats: SchedulerStats::default(),
        }
    }

    /// Link state seen by the last step
    pub fn mode(&self) -> LinkMode {
        self.mode
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Run one scheduling step
    ///
    /// Waits at most the configured dequeue timeout, so it always returns
    /// within one period plus the time to frame a single event.
    pub async fn step(&mut self) -> Result<StepOutcome, BridgeError> {
        let previous = self.mode;
        let result = self.transmit_one().await;
        if self.mode != previous {
            self.stats.link_transitions = self.stats.link_transitions.wrapping_add(1);
        }
        self.stats.record(&result);
        result
    }

    async fn transmit_one(&mut self) -> Result<StepOutcome, BridgeError> {
        if !self.link.link_present() {
            self.mode = LinkMode::LinkAbsent;
            self.link.pause();
            return Ok(StepOutcome::LinkAbsent);
        }
        self.mode = LinkMode::LinkPresent;

        if self.queue.is_empty() {
            // Release bytes held back while the link was away
            if !self.tx.is_empty() {
                self.link.notify_ready_for_more();
            }
            return Ok(StepOutcome::Idle);
        }

        let record = self.queue.dequeue(self.dequeue_timeout).await?;

        let mut frame = [0u8; PUBLISH_FRAME_SIZE];
        let written = Message::from(record).serialize(&mut frame)?;
        if written != PUBLISH_FRAME_SIZE {
            return Err(BridgeError::FrameSize { written });
        }

        let pushed = self.tx.push(&frame[..written]);
        // Whatever made it into the buffer has to go out
        self.link.notify_ready_for_more();

        if pushed != written {
            return Err(BridgeError::ShortBufferWrite {
                written: pushed,
                expected: written,
            });
        }

        Ok(StepOutcome::Sent(record))
    }

    /// Step once per period until `stop` is signalled
    ///
    /// Every step's result is passed to `report`. Errors never end the
    /// loop; only `stop` does, checked once per period.
    pub async fn run<S, F>(&mut self, stop: &Signal<S, ()>, mut report: F)
    where
        S: RawMutex,
        F: FnMut(StepReport),
    {
        let mut ticker = Ticker::every(self.period);

        loop {
            let previous = self.mode;
            let result = self.step().await;
            report(StepReport {
                result,
                mode: self.mode,
                mode_changed: self.mode != previous,
            });

            if let Either::Second(()) = select(ticker.next(), stop.wait()).await {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use meshbridge_protocol::{crc8, Direction, EventRecord, FRAME_START};

    type Queue = EventQueue<CriticalSectionRawMutex, 16>;
    type Buffer = TxBuffer<CriticalSectionRawMutex, 256>;

    #[derive(Debug, Default)]
    struct MockLink {
        present: bool,
        tx_enabled: bool,
        pauses: u32,
        notifies: u32,
    }

    impl LinkControl for MockLink {
        fn link_present(&mut self) -> bool {
            self.present
        }

        fn notify_ready_for_more(&mut self) {
            self.tx_enabled = true;
            self.notifies += 1;
        }

        fn pause(&mut self) {
            self.tx_enabled = false;
            self.pauses += 1;
        }
    }

    fn record(n: u16) -> EventRecord {
        EventRecord::new(0x0100 + n, 0x0075, 2000 + n)
    }

    fn fast_config() -> BridgeConfig {
        BridgeConfig {
            period_ms: 10,
            dequeue_timeout_ms: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_link_absent_pauses_and_keeps_queue() {
        let queue = Queue::new();
        let tx = Buffer::new();
        queue.enqueue(record(1)).unwrap();

        let mut scheduler = Scheduler::new(&queue, &tx, MockLink::default(), &fast_config());
        assert_eq!(block_on(scheduler.step()), Ok(StepOutcome::LinkAbsent));
        assert_eq!(scheduler.mode(), LinkMode::LinkAbsent);
        assert_eq!(scheduler.link().pauses, 1);
        assert!(!scheduler.link().tx_enabled);
        assert_eq!(queue.len(), 1);
        assert!(tx.is_empty());
    }

    #[test]
    fn test_idle_when_queue_empty() {
        let queue = Queue::new();
        let tx = Buffer::new();
        let link = MockLink {
            present: true,
            ..Default::default()
        };

        let mut scheduler = Scheduler::new(&queue, &tx, link, &fast_config());
        assert_eq!(block_on(scheduler.step()), Ok(StepOutcome::Idle));
        assert_eq!(scheduler.mode(), LinkMode::LinkPresent);
        assert_eq!(scheduler.link().notifies, 0);
        assert_eq!(scheduler.stats().link_transitions, 1);
    }

    #[test]
    fn test_sends_one_publish_frame_per_step() {
        let queue = Queue::new();
        let tx = Buffer::new();
        queue.enqueue(record(1)).unwrap();
        queue.enqueue(record(2)).unwrap();
        let link = MockLink {
            present: true,
            ..Default::default()
        };

        let mut scheduler = Scheduler::new(&queue, &tx, link, &fast_config());
        assert_eq!(block_on(scheduler.step()), Ok(StepOutcome::Sent(record(1))));
        assert_eq!(tx.len(), PUBLISH_FRAME_SIZE);
        assert_eq!(queue.len(), 1);
        assert!(scheduler.link().tx_enabled);

        let mut frame = [0u8; 16];
        assert_eq!(tx.drain_up_to(&mut frame), PUBLISH_FRAME_SIZE);
        assert_eq!(&frame[..3], &[FRAME_START, 0x01, 6]);
        assert_eq!(&frame[3..9], &[0x01, 0x01, 0x00, 0x75, 0x07, 0xD1]);
        assert_eq!(frame[9], crc8(&frame[..9]));
    }

    #[test]
    fn test_short_write_reported_and_link_notified() {
        let queue = Queue::new();
        let tx: TxBuffer<CriticalSectionRawMutex, 16> = TxBuffer::new();
        tx.push(&[0; 12]);
        queue.enqueue(record(1)).unwrap();
        let link = MockLink {
            present: true,
            ..Default::default()
        };

        let mut scheduler = Scheduler::new(&queue, &tx, link, &fast_config());
        let result = block_on(scheduler.step());
        assert_eq!(
            result,
            Err(BridgeError::ShortBufferWrite {
                written: 4,
                expected: PUBLISH_FRAME_SIZE
            })
        );
        assert!(result.unwrap_err().is_stream_corruption());
        assert!(scheduler.link().tx_enabled);
        assert_eq!(scheduler.stats().short_writes, 1);
        assert!(queue.is_empty());

        // Loop keeps going on the next period
        assert_eq!(block_on(scheduler.step()), Ok(StepOutcome::Idle));
    }

    #[test]
    fn test_toggling_link_is_idempotent() {
        let queue = Queue::new();
        let tx = Buffer::new();
        let mut scheduler = Scheduler::new(&queue, &tx, MockLink::default(), &fast_config());

        for i in 0..6 {
            scheduler.link_mut().present = i % 2 == 1;
            block_on(scheduler.step()).unwrap();
        }
        assert_eq!(scheduler.link().pauses, 3);
        assert_eq!(scheduler.stats().link_transitions, 5);
        assert_eq!(scheduler.stats().steps, 6);
    }

    #[test]
    fn test_backlog_drains_in_fifo_after_link_returns() {
        let queue = Queue::new();
        let tx = Buffer::new();
        let mut scheduler = Scheduler::new(&queue, &tx, MockLink::default(), &fast_config());

        for n in 0..3 {
            queue.enqueue(record(n)).unwrap();
        }
        for _ in 0..5 {
            assert_eq!(block_on(scheduler.step()), Ok(StepOutcome::LinkAbsent));
        }
        assert_eq!(queue.len(), 3);
        assert!(tx.is_empty());

        scheduler.link_mut().present = true;
        for n in 0..3 {
            assert_eq!(block_on(scheduler.step()), Ok(StepOutcome::Sent(record(n))));
            assert_eq!(queue.len(), 2 - n as usize);
        }
        assert_eq!(block_on(scheduler.step()), Ok(StepOutcome::Idle));

        let mut bytes = [0u8; 64];
        assert_eq!(tx.drain_up_to(&mut bytes), 3 * PUBLISH_FRAME_SIZE);
        for (n, frame) in bytes[..30].chunks(PUBLISH_FRAME_SIZE).enumerate() {
            assert_eq!(frame[0], FRAME_START);
            assert_eq!(frame[9], crc8(&frame[..9]));
            let expected = record(n as u16);
            assert_eq!(u16::from_be_bytes([frame[3], frame[4]]), expected.address);
            assert_eq!(u16::from_be_bytes([frame[7], frame[8]]), expected.value);
            assert!(Message::deserialize(frame, Direction::ToHost).is_err());
        }
        assert_eq!(scheduler.stats().frames_sent, 3);
    }

    #[test]
    fn test_run_until_stopped() {
        let queue = Queue::new();
        let tx = Buffer::new();
        let stop: Signal<CriticalSectionRawMutex, ()> = Signal::new();
        queue.enqueue(record(0)).unwrap();
        let link = MockLink {
            present: true,
            ..Default::default()
        };

        let mut scheduler = Scheduler::new(&queue, &tx, link, &fast_config());
        let mut reports = std::vec::Vec::new();
        block_on(scheduler.run(&stop, |report| {
            reports.push(report);
            if reports.len() >= 3 {
                stop.signal(());
            }
        }));

        // A late tick can win the race with the stop signal once
        assert!(reports.len() >= 3);
        assert_eq!(reports[0].result, Ok(StepOutcome::Sent(record(0))));
        assert!(reports[0].mode_changed);
        assert_eq!(reports[1].result, Ok(StepOutcome::Idle));
        assert!(!reports[1].mode_changed);
        assert_eq!(reports[2].mode, LinkMode::LinkPresent);
    }
}
