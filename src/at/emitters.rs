//! Outbound command emitters.
//!
//! One function per negotiation or ad hoc step. Each renders a fixed AT
//! template into a stack buffer and hands it to the transport, returning
//! the transport's own result. Emitters never touch connection state; the
//! engine decides when a command may be sent.

use core::fmt::Write as _;

use crate::at;
use crate::connection::ChannelId;
use crate::ports::RfcommTransport;

/// Fits the longest rendered command at the configured maxima: `AT+BAC=`
/// plus twenty three-digit codec ids with separators and CRLF. Callers are
/// bounded by config validation, so rendering cannot overflow.
const CMD_BUFFER_SIZE: usize = 96;

type CmdBuffer = heapless::String<CMD_BUFFER_SIZE>;

fn push_joined<V: core::fmt::Display>(cmd: &mut CmdBuffer, items: impl Iterator<Item = V>) {
    let mut first = true;
    for item in items {
        if !first {
            let _ = write!(cmd, ",");
        }
        let _ = write!(cmd, "{item}");
        first = false;
    }
}

/// `AT+BRSF=<features>`: open the handshake with the local feature bitmap.
pub fn exchange_supported_features<T: RfcommTransport>(
    transport: &mut T,
    channel: ChannelId,
    features: u32,
) -> Result<(), T::Error> {
    let mut cmd = CmdBuffer::new();
    let _ = write!(cmd, "AT{}={}\r\n", at::SUPPORTED_FEATURES, features);
    transport.send(channel, cmd.as_bytes())
}

/// `AT+BAC=<c,c,...>`: announce the locally supported codecs.
pub fn notify_on_codecs<T: RfcommTransport>(
    transport: &mut T,
    channel: ChannelId,
    codecs: &[u8],
) -> Result<(), T::Error> {
    let mut cmd = CmdBuffer::new();
    let _ = write!(cmd, "AT{}=", at::AVAILABLE_CODECS);
    push_joined(&mut cmd, codecs.iter());
    let _ = write!(cmd, "\r\n");
    transport.send(channel, cmd.as_bytes())
}

/// `AT+CIND=?`: ask the AG to describe its indicators.
pub fn retrieve_indicators<T: RfcommTransport>(
    transport: &mut T,
    channel: ChannelId,
) -> Result<(), T::Error> {
    let mut cmd = CmdBuffer::new();
    let _ = write!(cmd, "AT{}=?\r\n", at::INDICATOR);
    transport.send(channel, cmd.as_bytes())
}

/// `AT+CIND?`: read the current indicator values.
pub fn retrieve_indicators_status<T: RfcommTransport>(
    transport: &mut T,
    channel: ChannelId,
) -> Result<(), T::Error> {
    let mut cmd = CmdBuffer::new();
    let _ = write!(cmd, "AT{}?\r\n", at::INDICATOR);
    transport.send(channel, cmd.as_bytes())
}

/// `AT+CMER=3,0,0,<0|1>`: switch unsolicited indicator reporting on or off.
pub fn set_indicator_status_updates<T: RfcommTransport>(
    transport: &mut T,
    channel: ChannelId,
    enable: bool,
) -> Result<(), T::Error> {
    let mut cmd = CmdBuffer::new();
    let _ = write!(
        cmd,
        "AT{}=3,0,0,{}\r\n",
        at::ENABLE_INDICATOR_STATUS_UPDATE,
        u8::from(enable)
    );
    transport.send(channel, cmd.as_bytes())
}

/// `AT+BIEV=<bit,bit,...>`: per-indicator reporting flags, one 0/1 per AG
/// indicator in table order.
pub fn set_individual_indicator_updates<T: RfcommTransport>(
    transport: &mut T,
    channel: ChannelId,
    bitmap: u32,
    indicator_count: usize,
) -> Result<(), T::Error> {
    let mut cmd = CmdBuffer::new();
    let _ = write!(cmd, "AT{}=", at::ENABLE_INDIVIDUAL_INDICATOR_UPDATES);
    push_joined(&mut cmd, (0..indicator_count).map(|i| (bitmap >> i) & 1));
    let _ = write!(cmd, "\r\n");
    transport.send(channel, cmd.as_bytes())
}

/// `AT+CHLD=?`: ask for the call hold and multiparty capabilities.
pub fn retrieve_call_hold_services<T: RfcommTransport>(
    transport: &mut T,
    channel: ChannelId,
) -> Result<(), T::Error> {
    let mut cmd = CmdBuffer::new();
    let _ = write!(cmd, "AT{}=?\r\n", at::CALL_HOLD_SERVICES);
    transport.send(channel, cmd.as_bytes())
}

/// `AT+BIND=<id,id,...>`: announce the locally supported HF indicators.
pub fn list_generic_status_indicators<T: RfcommTransport>(
    transport: &mut T,
    channel: ChannelId,
    indicators: &[u16],
) -> Result<(), T::Error> {
    let mut cmd = CmdBuffer::new();
    let _ = write!(cmd, "AT{}=", at::GENERIC_STATUS_INDICATOR);
    push_joined(&mut cmd, indicators.iter());
    let _ = write!(cmd, "\r\n");
    transport.send(channel, cmd.as_bytes())
}

/// `AT+BIND=?`: ask which HF indicators the AG supports.
pub fn retrieve_generic_status_indicators<T: RfcommTransport>(
    transport: &mut T,
    channel: ChannelId,
) -> Result<(), T::Error> {
    let mut cmd = CmdBuffer::new();
    let _ = write!(cmd, "AT{}=?\r\n", at::GENERIC_STATUS_INDICATOR);
    transport.send(channel, cmd.as_bytes())
}

/// `AT+BIND?`: ask for the initial enabled state of the HF indicators.
pub fn retrieve_initial_generic_status_indicators<T: RfcommTransport>(
    transport: &mut T,
    channel: ChannelId,
) -> Result<(), T::Error> {
    let mut cmd = CmdBuffer::new();
    let _ = write!(cmd, "AT{}?\r\n", at::GENERIC_STATUS_INDICATOR);
    transport.send(channel, cmd.as_bytes())
}

/// `AT+COPS=3,0`: select the long alphanumeric operator-name format.
pub fn query_operator_name_format<T: RfcommTransport>(
    transport: &mut T,
    channel: ChannelId,
) -> Result<(), T::Error> {
    let mut cmd = CmdBuffer::new();
    let _ = write!(cmd, "AT{}=3,0\r\n", at::QUERY_OPERATOR_SELECTION);
    transport.send(channel, cmd.as_bytes())
}

/// `AT+COPS?`: read the operator name.
pub fn query_operator_name<T: RfcommTransport>(
    transport: &mut T,
    channel: ChannelId,
) -> Result<(), T::Error> {
    let mut cmd = CmdBuffer::new();
    let _ = write!(cmd, "AT{}?\r\n", at::QUERY_OPERATOR_SELECTION);
    transport.send(channel, cmd.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAX_NUM_CODECS, MAX_NUM_HF_INDICATORS};

    /// Captures every sent line for exact wire-format assertions.
    #[derive(Default)]
    struct CaptureTransport {
        sent: Vec<(ChannelId, String)>,
    }

    impl RfcommTransport for CaptureTransport {
        type Error = ();

        fn can_send_now(&self, _channel: ChannelId) -> bool {
            true
        }

        fn send(&mut self, channel: ChannelId, data: &[u8]) -> Result<(), ()> {
            self.sent
                .push((channel, String::from_utf8(data.to_vec()).unwrap()));
            Ok(())
        }

        fn disconnect(&mut self, _channel: ChannelId) -> Result<(), ()> {
            Ok(())
        }
    }

    fn last_sent(t: &CaptureTransport) -> &str {
        &t.sent.last().unwrap().1
    }

    #[test]
    fn feature_exchange_wire_format() {
        let mut t = CaptureTransport::default();
        exchange_supported_features(&mut t, 3, 438).unwrap();
        assert_eq!(last_sent(&t), "AT+BRSF=438\r\n");
        assert_eq!(t.sent[0].0, 3);
    }

    #[test]
    fn codec_list_is_comma_joined() {
        let mut t = CaptureTransport::default();
        notify_on_codecs(&mut t, 1, &[1, 2]).unwrap();
        assert_eq!(last_sent(&t), "AT+BAC=1,2\r\n");

        notify_on_codecs(&mut t, 1, &[1]).unwrap();
        assert_eq!(last_sent(&t), "AT+BAC=1\r\n");
    }

    #[test]
    fn indicator_discovery_and_status_forms() {
        let mut t = CaptureTransport::default();
        retrieve_indicators(&mut t, 1).unwrap();
        assert_eq!(last_sent(&t), "AT+CIND=?\r\n");
        retrieve_indicators_status(&mut t, 1).unwrap();
        assert_eq!(last_sent(&t), "AT+CIND?\r\n");
    }

    #[test]
    fn cmer_carries_enable_flag() {
        let mut t = CaptureTransport::default();
        set_indicator_status_updates(&mut t, 1, true).unwrap();
        assert_eq!(last_sent(&t), "AT+CMER=3,0,0,1\r\n");
        set_indicator_status_updates(&mut t, 1, false).unwrap();
        assert_eq!(last_sent(&t), "AT+CMER=3,0,0,0\r\n");
    }

    #[test]
    fn individual_updates_render_bitmap_in_table_order() {
        let mut t = CaptureTransport::default();
        set_individual_indicator_updates(&mut t, 1, 0b101, 4).unwrap();
        assert_eq!(last_sent(&t), "AT+BIEV=1,0,1,0\r\n");
    }

    #[test]
    fn call_hold_query() {
        let mut t = CaptureTransport::default();
        retrieve_call_hold_services(&mut t, 1).unwrap();
        assert_eq!(last_sent(&t), "AT+CHLD=?\r\n");
    }

    #[test]
    fn bind_request_forms() {
        let mut t = CaptureTransport::default();
        list_generic_status_indicators(&mut t, 1, &[1, 2]).unwrap();
        assert_eq!(last_sent(&t), "AT+BIND=1,2\r\n");
        retrieve_generic_status_indicators(&mut t, 1).unwrap();
        assert_eq!(last_sent(&t), "AT+BIND=?\r\n");
        retrieve_initial_generic_status_indicators(&mut t, 1).unwrap();
        assert_eq!(last_sent(&t), "AT+BIND?\r\n");
    }

    #[test]
    fn operator_query_forms() {
        let mut t = CaptureTransport::default();
        query_operator_name_format(&mut t, 1).unwrap();
        assert_eq!(last_sent(&t), "AT+COPS=3,0\r\n");
        query_operator_name(&mut t, 1).unwrap();
        assert_eq!(last_sent(&t), "AT+COPS?\r\n");
    }

    #[test]
    fn maximum_lists_fit_the_buffer() {
        let mut t = CaptureTransport::default();
        let codecs = [255u8; MAX_NUM_CODECS];
        notify_on_codecs(&mut t, 1, &codecs).unwrap();
        let line = last_sent(&t);
        assert!(line.starts_with("AT+BAC=255,"));
        assert!(line.ends_with("255\r\n"));
        assert!(line.len() <= CMD_BUFFER_SIZE);

        let indicators = [0xFFFFu16; MAX_NUM_HF_INDICATORS];
        list_generic_status_indicators(&mut t, 1, &indicators).unwrap();
        let line = last_sent(&t);
        assert!(line.starts_with("AT+BIND=65535,"));
        assert!(line.ends_with("\r\n"));
        assert!(line.len() <= CMD_BUFFER_SIZE);
    }
}
