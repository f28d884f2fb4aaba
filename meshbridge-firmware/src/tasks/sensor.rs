//! On-chip temperature sensor task
//!
//! Example event producer: samples the RP2040 die temperature and submits
//! it as an ambient-temperature event.

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel};
use embassy_time::Ticker;

use meshbridge_core::{BridgeConfig, EventSink};
use meshbridge_protocol::events::PROPERTY_AMBIENT_TEMPERATURE;
use meshbridge_protocol::{EventRecord, SensorValue};

use crate::channels::EVENT_QUEUE;

/// ADC reference voltage in microvolts
const ADC_VREF_UV: i64 = 3_300_000;

/// Full-scale ADC reading
const ADC_MAX: i64 = 4096;

/// Sensor output at 27 °C, in microvolts
const TEMP_SENSOR_V27_UV: i64 = 706_000;

/// Sensor slope in microvolts per °C (negative)
const TEMP_SENSOR_SLOPE_UV: i64 = 1_721;

/// Convert a raw ADC reading of the temperature sensor to °C
///
/// T = 27 - (V - 0.706) / 0.001721
fn raw_to_sensor_value(raw: u16) -> SensorValue {
    let microvolts = raw as i64 * ADC_VREF_UV / ADC_MAX;
    let micro_c = 27_000_000 - (microvolts - TEMP_SENSOR_V27_UV) * 1_000_000 / TEMP_SENSOR_SLOPE_UV;
    SensorValue::new((micro_c / 1_000_000) as i32, (micro_c % 1_000_000) as i32)
}

/// Sensor task - samples the die temperature every sensor interval
#[embassy_executor::task]
pub async fn sensor_task(
    mut adc: Adc<'static, Async>,
    mut channel: Channel<'static>,
    config: BridgeConfig,
) {
    info!(
        "Sensor task started (every {} ms, node {:#x})",
        config.sensor_interval_ms, config.node_address
    );

    let mut ticker = Ticker::every(config.sensor_interval());

    loop {
        match adc.read(&mut channel).await {
            Ok(raw) => {
                let reading = raw_to_sensor_value(raw);
                let record = EventRecord::from_sensor_value(
                    config.node_address,
                    PROPERTY_AMBIENT_TEMPERATURE,
                    reading,
                );
                debug!(
                    "Temperature {} C + {} uC (raw {}) -> {}",
                    reading.val1, reading.val2, raw, record.value
                );
                EVENT_QUEUE.submit(record);
            }
            Err(e) => {
                warn!("ADC read failed: {:?}", e);
            }
        }

        ticker.next().await;
    }
}
