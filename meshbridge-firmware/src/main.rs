//! Meshbridge - Sensor-to-Serial Bridge Firmware
//!
//! Main firmware binary for RP2040-based boards. Sensor events are queued,
//! framed one per scheduler period and streamed to a host over UART0 while
//! the host holds the link-detect line high.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use crate::config::EMBEDDED_CONFIG;
use crate::link::UartLink;

mod channels;
mod config;
mod link;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Meshbridge firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = EMBEDDED_CONFIG;
    info!(
        "Config: period={}ms, dequeue_timeout={}ms, chunk={}B",
        config.period_ms, config.dequeue_timeout_ms, config.tx_chunk_len
    );

    // Host link on UART0 (GPIO0 TX, GPIO1 RX), 115200 baud default
    let uart_config = UartConfig::default();

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 64]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    // Host DTR on GPIO2, low when no terminal is attached
    let detect = Input::new(p.PIN_2, Pull::Down);
    let link = UartLink::new(detect);

    info!("UART link initialized");

    let adc = Adc::new(p.ADC, Irqs, embassy_rp::adc::Config::default());
    let temp_channel = Channel::new_temp_sensor(p.ADC_TEMP_SENSOR);

    spawner.spawn(tasks::link_tx_task(tx, config.tx_chunk_len)).unwrap();
    spawner.spawn(tasks::link_rx_task(rx)).unwrap();
    spawner.spawn(tasks::scheduler_task(link, config)).unwrap();
    spawner
        .spawn(tasks::sensor_task(adc, temp_channel, config))
        .unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!(
            "Heartbeat: {} queued, {} dropped, {} filtered, {} tx bytes pending",
            channels::EVENT_QUEUE.len(),
            channels::EVENT_QUEUE.dropped(),
            channels::EVENT_QUEUE.filtered(),
            channels::TX_BUFFER.len()
        );
    }
}
