//! Sensor events forwarded to the host

/// Precise present ambient temperature (mesh device property 0x0075)
pub const PROPERTY_AMBIENT_TEMPERATURE: u16 = 0x0075;

/// Present ambient relative humidity (mesh device property 0x0076)
pub const PROPERTY_AMBIENT_HUMIDITY: u16 = 0x0076;

/// Fixed-point scale of [`EventRecord::value`]: 1 unit = 0.01
pub const VALUE_SCALE: u16 = 100;

/// One sensor event, as produced by the event source and carried in a
/// `Publish` frame
///
/// Wire layout (big-endian): `address(2) | property_id(2) | value(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventRecord {
    /// Unicast address of the reporting node
    pub address: u16,
    /// Device property identifier
    pub property_id: u16,
    /// Reading in hundredths (e.g. 2345 = 23.45)
    pub value: u16,
}

/// Encoded size of an [`EventRecord`]
pub const EVENT_RECORD_SIZE: usize = 6;

impl EventRecord {
    /// Create a new event record
    pub const fn new(address: u16, property_id: u16, value: u16) -> Self {
        Self {
            address,
            property_id,
            value,
        }
    }

    /// Build a record from a two-part sensor reading
    pub fn from_sensor_value(address: u16, property_id: u16, reading: SensorValue) -> Self {
        Self::new(address, property_id, reading.to_fixed_point())
    }

    /// Write the big-endian payload into `buf`
    pub fn write_to(&self, buf: &mut [u8; EVENT_RECORD_SIZE]) {
        buf[0..2].copy_from_slice(&self.address.to_be_bytes());
        buf[2..4].copy_from_slice(&self.property_id.to_be_bytes());
        buf[4..6].copy_from_slice(&self.value.to_be_bytes());
    }

    /// Parse a big-endian payload
    pub fn read_from(buf: &[u8; EVENT_RECORD_SIZE]) -> Self {
        Self {
            address: u16::from_be_bytes([buf[0], buf[1]]),
            property_id: u16::from_be_bytes([buf[2], buf[3]]),
            value: u16::from_be_bytes([buf[4], buf[5]]),
        }
    }

    /// Returns true if this property is one the bridge forwards
    pub fn is_forwarded(&self) -> bool {
        is_forwarded_property(self.property_id)
    }
}

/// Returns true for the sensor properties the bridge forwards to the host
pub fn is_forwarded_property(property_id: u16) -> bool {
    matches!(
        property_id,
        PROPERTY_AMBIENT_TEMPERATURE | PROPERTY_AMBIENT_HUMIDITY
    )
}

/// Sensor reading split into an integer part and a fraction in millionths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorValue {
    /// Integer part
    pub val1: i32,
    /// Fractional part, in millionths
    pub val2: i32,
}

impl SensorValue {
    pub const fn new(val1: i32, val2: i32) -> Self {
        Self { val1, val2 }
    }

    /// Convert to hundredths, truncated to 16 bits
    ///
    /// Out-of-range readings keep their low 16 bits.
    pub fn to_fixed_point(self) -> u16 {
        let whole = self.val1.wrapping_mul(VALUE_SCALE as i32) as u16;
        let frac = (self.val2 / 10_000) as u16;
        whole.wrapping_add(frac)
    }
}
