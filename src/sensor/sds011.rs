//! Serial adapter for the Nova SDS011 particulate-matter sensor.
//!
//! Command frames are 19 bytes: head, command id, 15 data bytes (the last
//! two address a specific device id, `0xff 0xff` addresses any), a modulo-256
//! checksum over the data bytes and a tail byte. Query replies are 10 bytes
//! carrying both PM values in tenths of µg/m³.

use std::io::{self, Read, Write};
use std::time::Duration;

use log::{debug, warn};
use serialport::SerialPort;

use super::{SensorError, SensorSession};
use crate::record::RawReading;

const BAUD_RATE: u32 = 9600;
const READ_TIMEOUT: Duration = Duration::from_secs(2);

const FRAME_HEAD: u8 = 0xaa;
const FRAME_TAIL: u8 = 0xab;
const COMMAND_ID: u8 = 0xb4;
const REPLY_ID: u8 = 0xc0;

const CMD_QUERY: u8 = 0x04;
const CMD_POWER: u8 = 0x06;

const COMMAND_FRAME_SIZE: usize = 19;
const REPLY_FRAME_SIZE: usize = 10;

// How many stray bytes to skip while hunting for a frame head before
// giving up on this read.
const MAX_SYNC_BYTES: usize = 64;

/// Exclusive session with an SDS011 on a serial port. The port is opened
/// once at startup and released when the session drops.
pub struct Sds011Session {
    port: Box<dyn SerialPort>,
}

impl Sds011Session {
    pub fn open(path: &str) -> Result<Self, SensorError> {
        let port = serialport::new(path, BAUD_RATE)
            .timeout(READ_TIMEOUT)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|source| SensorError::Open {
                port: path.to_string(),
                source,
            })?;
        Ok(Self { port })
    }

    fn send_command(
        &mut self,
        action: &'static str,
        frame: &[u8; COMMAND_FRAME_SIZE],
    ) -> Result<(), SensorError> {
        self.port
            .write_all(frame)
            .and_then(|()| self.port.flush())
            .map_err(|source| SensorError::Io { action, source })
    }

    /// Reads one reply frame, scanning past stray bytes until a frame head
    /// shows up. `Ok(None)` on timeout or when no frame head is found;
    /// only transport failures become errors.
    fn read_reply(
        &mut self,
        action: &'static str,
    ) -> Result<Option<[u8; REPLY_FRAME_SIZE]>, SensorError> {
        for _ in 0..MAX_SYNC_BYTES {
            match self.read_byte(action)? {
                Some(FRAME_HEAD) => {
                    let mut frame = [0u8; REPLY_FRAME_SIZE];
                    frame[0] = FRAME_HEAD;
                    return match self.port.read_exact(&mut frame[1..]) {
                        Ok(()) => Ok(Some(frame)),
                        Err(err) if is_timeout(&err) => {
                            debug!("sensor reply truncated during {action}");
                            Ok(None)
                        }
                        Err(source) => Err(SensorError::Io { action, source }),
                    };
                }
                Some(_) => continue,
                None => return Ok(None),
            }
        }
        Ok(None)
    }

    fn read_byte(&mut self, action: &'static str) -> Result<Option<u8>, SensorError> {
        let mut byte = [0u8; 1];
        match self.port.read_exact(&mut byte) {
            Ok(()) => Ok(Some(byte[0])),
            Err(err) if is_timeout(&err) => {
                debug!("sensor read timed out during {action}");
                Ok(None)
            }
            Err(source) => Err(SensorError::Io { action, source }),
        }
    }
}

impl SensorSession for Sds011Session {
    async fn wake(&mut self) -> Result<(), SensorError> {
        self.send_command("wake", &power_frame(true))?;
        // The acknowledgement is unreliable when the sensor was already
        // awake; whatever arrives is drained and dropped.
        let _ = self.read_reply("wake")?;
        Ok(())
    }

    async fn query(&mut self) -> Result<Option<RawReading>, SensorError> {
        self.send_command("query", &query_frame())?;
        let Some(frame) = self.read_reply("query")? else {
            return Ok(None);
        };
        let reading = decode_reply(&frame);
        if reading.is_none() {
            warn!("discarding malformed sensor reply: {frame:02x?}");
        }
        Ok(reading)
    }

    async fn sleep(&mut self) -> Result<(), SensorError> {
        self.send_command("sleep", &power_frame(false))?;
        let _ = self.read_reply("sleep")?;
        Ok(())
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::UnexpectedEof
    )
}

fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

fn command_frame(data: &[u8]) -> [u8; COMMAND_FRAME_SIZE] {
    let mut frame = [0u8; COMMAND_FRAME_SIZE];
    frame[0] = FRAME_HEAD;
    frame[1] = COMMAND_ID;
    frame[2..2 + data.len()].copy_from_slice(data);
    frame[15] = 0xff;
    frame[16] = 0xff;
    frame[17] = checksum(&frame[2..17]);
    frame[18] = FRAME_TAIL;
    frame
}

fn query_frame() -> [u8; COMMAND_FRAME_SIZE] {
    command_frame(&[CMD_QUERY])
}

/// Set-power command: byte 1 selects "set" (as opposed to "get"), byte 2
/// selects work (1) or sleep (0).
fn power_frame(work: bool) -> [u8; COMMAND_FRAME_SIZE] {
    command_frame(&[CMD_POWER, 1, work as u8])
}

/// Decodes a query reply into µg/m³ values. `None` when framing or the
/// checksum does not hold up.
fn decode_reply(frame: &[u8; REPLY_FRAME_SIZE]) -> Option<RawReading> {
    if frame[0] != FRAME_HEAD || frame[1] != REPLY_ID || frame[9] != FRAME_TAIL {
        return None;
    }
    if checksum(&frame[2..8]) != frame[8] {
        return None;
    }
    Some(RawReading {
        pm2_5: u16::from_le_bytes([frame[2], frame[3]]) as f64 / 10.0,
        pm10: u16::from_le_bytes([frame[4], frame[5]]) as f64 / 10.0,
    })
}
