//! Link UART transmit task
//!
//! Drains the transmit buffer to the host whenever the gate is open.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use meshbridge_core::config::MAX_TX_CHUNK_LEN;

use crate::channels::{TX_BUFFER, TX_GATE};

/// Link TX task - moves framed bytes from the buffer to the UART
#[embassy_executor::task]
pub async fn link_tx_task(mut tx: BufferedUartTx, chunk_len: u16) {
    info!("Link TX task started ({} byte chunks)", chunk_len);

    let mut chunk = [0u8; MAX_TX_CHUNK_LEN as usize];
    let chunk_len = (chunk_len as usize).clamp(1, chunk.len());

    loop {
        let n = TX_GATE.next_chunk(&TX_BUFFER, &mut chunk[..chunk_len]).await;
        trace!("TX: {} bytes", n);

        if let Err(e) = tx.write_all(&chunk[..n]).await {
            // The chunk is already out of the buffer; the host resyncs on 0xAA
            warn!("UART write error, {} bytes lost: {:?}", n, e);
        }
    }
}
