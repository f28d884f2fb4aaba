//! Link UART receive task
//!
//! The host only sends control frames. They are decoded and logged; none of
//! them changes the pipeline yet.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use meshbridge_core::{ControlParser, InboundHandler};
use meshbridge_protocol::{CodecError, Message};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Inbound handler that logs raw bytes and decoded control frames
struct LoggingSink {
    parser: ControlParser,
}

impl InboundHandler for LoggingSink {
    fn on_bytes(&mut self, bytes: &[u8]) {
        trace!("RX: {=[u8]:x}", bytes);
        self.parser.feed_bytes(bytes, handle_control);
    }
}

fn handle_control(result: Result<Message, CodecError>) {
    match result {
        Ok(Message::Poll) => debug!("Poll received"),
        Ok(Message::Backlog(count)) => debug!("Backlog received: {}", count),
        Ok(Message::Ack) => trace!("ACK received"),
        Ok(Message::Nack) => trace!("NACK received"),
        Ok(msg) => warn!("Unexpected message from host: {:?}", msg),
        Err(e) => warn!("Control frame error: {:?}", e),
    }
}

/// Link RX task - receives and logs control frames from the host
#[embassy_executor::task]
pub async fn link_rx_task(mut rx: BufferedUartRx) {
    info!("Link RX task started");

    let mut sink = LoggingSink {
        parser: ControlParser::new(),
    };
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => sink.on_bytes(&buf[..n]),
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
                sink.parser.reset();
            }
        }
    }
}
