//! UART link adapter
//!
//! Presence comes from the host's DTR line on a link-detect pin. The
//! transmit side is the `link_tx` task, gated by [`TX_GATE`].

use embassy_rp::gpio::Input;

use meshbridge_core::LinkControl;

use crate::channels::TX_GATE;

/// Link control for the host UART
pub struct UartLink {
    detect: Input<'static>,
}

impl UartLink {
    pub fn new(detect: Input<'static>) -> Self {
        Self { detect }
    }
}

impl LinkControl for UartLink {
    fn link_present(&mut self) -> bool {
        // DTR asserted by the host
        self.detect.is_high()
    }

    fn notify_ready_for_more(&mut self) {
        TX_GATE.enable();
    }

    fn pause(&mut self) {
        TX_GATE.disable();
    }
}
