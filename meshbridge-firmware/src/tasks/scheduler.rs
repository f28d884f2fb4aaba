//! Transmission scheduler task
//!
//! Runs the core scheduler once per period and logs what each step did.

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use meshbridge_core::{
    BridgeConfig, BridgeError, LinkMode, Scheduler, StepOutcome, StepReport,
    EVENT_QUEUE_CAPACITY, TX_BUFFER_CAPACITY,
};

use crate::channels::{EVENT_QUEUE, SCHEDULER_STOP, TX_BUFFER};
use crate::link::UartLink;

type BridgeScheduler = Scheduler<
    'static,
    CriticalSectionRawMutex,
    UartLink,
    EVENT_QUEUE_CAPACITY,
    TX_BUFFER_CAPACITY,
>;

/// Scheduler task - one event from the queue to the UART per period
#[embassy_executor::task]
pub async fn scheduler_task(link: UartLink, config: BridgeConfig) {
    info!("Scheduler task started ({} ms period)", config.period_ms);

    let mut scheduler: BridgeScheduler = Scheduler::new(&EVENT_QUEUE, &TX_BUFFER, link, &config);
    let mut last_dropped = 0;

    scheduler
        .run(&SCHEDULER_STOP, |report| {
            log_report(&report);

            let dropped = EVENT_QUEUE.dropped();
            if dropped != last_dropped {
                warn!("Event queue full, {} events dropped so far", dropped);
                last_dropped = dropped;
            }
        })
        .await;

    let stats = scheduler.stats();
    info!(
        "Scheduler stopped: {} steps, {} frames sent, {} short writes",
        stats.steps, stats.frames_sent, stats.short_writes
    );
}

fn log_report(report: &StepReport) {
    if report.mode_changed {
        match report.mode {
            LinkMode::LinkPresent => info!("Link up"),
            LinkMode::LinkAbsent => info!("Link down, holding {} events", EVENT_QUEUE.len()),
        }
    }

    match report.result {
        Ok(StepOutcome::Sent(record)) => debug!(
            "Sent event {:#x}/{:#x} = {}",
            record.address, record.property_id, record.value
        ),
        Ok(StepOutcome::Idle) | Ok(StepOutcome::LinkAbsent) => {}
        Err(e) if e.is_stream_corruption() => {
            error!("Partial frame on the wire: {:?}", e);
        }
        Err(BridgeError::QueueTimeout) => trace!("No event within dequeue timeout"),
        Err(e) => warn!("Scheduler step failed: {:?}", e),
    }
}
