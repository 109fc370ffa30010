//! Codec for function 0x06 / Write Holding Register commands.
//!
//! Requests and responses share one payload shape; a [`Direction`] tag
//! selects which validation applies. Requests are only constructible through
//! [`WriteRequestBuilder`], which refuses registers outside the write-safe
//! allow-list before a single byte is produced. Responses merely report what
//! the device already did, so an unsafe register there is logged rather than
//! rejected.

use thiserror::Error;
use tracing::warn;

use crate::register::HoldingRegister;

/// Inner function code selecting the write-single-register operation. The
/// header's outer function code stays 0x02 regardless.
pub const WRITE_SINGLE_REGISTER: u8 = 0x06;

/// Serial of the responding data adapter. Outbound requests hardcode this
/// dummy value.
pub const DUMMY_SERIAL: &[u8; 10] = b"AB1234G567";

/// Conventional slave address of the inverter behind the gateway.
pub const SLAVE_ADDRESS: u8 = 0x32;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Register must be set")]
    RegisterNotSet,

    #[error("Register value must be set")]
    ValueNotSet,

    #[error("Value {0} must be an unsigned 16-bit int")]
    ValueOverflow(i32),

    #[error("{0:?} is not safe to write to")]
    UnsafeRegister(HoldingRegister),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Write register payload too short: expected {expected} bytes, got {actual}")]
    PayloadTooShort { expected: usize, actual: usize },

    #[error("Unexpected inner function code: expected {expected:#04x}, got {actual:#04x}")]
    UnexpectedFunctionCode { expected: u8, actual: u8 },

    #[error("Unknown holding register {0:#06x}")]
    UnknownRegister(u16),
}

/// Whether a command travels towards the device or came back from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Request,
    Response,
}

/// A decoded or to-be-encoded write-single-register command. Immutable once
/// constructed; requests carry a check code computed at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteHoldingRegisterCommand {
    direction: Direction,
    register: HoldingRegister,
    value: u16,
    check: u16,
}

pub struct WriteRequestBuilder {
    register: Option<HoldingRegister>,
    value: Option<i32>,
}

impl WriteRequestBuilder {
    pub fn register(mut self, register: HoldingRegister) -> Self {
        self.register = Some(register);
        self
    }

    pub fn value(mut self, value: i32) -> Self {
        self.value = Some(value);
        self
    }

    /// Validate and construct the request. Failure here is the refusal: an
    /// invalid or unsafe request never reaches an encodable state.
    pub fn build(self) -> Result<WriteHoldingRegisterCommand, ValidationError> {
        let register = match self.register {
            Some(register) => register,
            None => return Err(ValidationError::RegisterNotSet),
        };
        let value = match self.value {
            Some(value) => {
                if !(0..=0xFFFF).contains(&value) {
                    return Err(ValidationError::ValueOverflow(value));
                }
                value as u16
            }
            None => return Err(ValidationError::ValueNotSet),
        };
        if !register.is_write_safe() {
            return Err(ValidationError::UnsafeRegister(register));
        }

        Ok(WriteHoldingRegisterCommand {
            direction: Direction::Request,
            register,
            value,
            check: check_code(register, value),
        })
    }
}

impl WriteHoldingRegisterCommand {
    /// Create a new builder for a write request.
    pub fn builder() -> WriteRequestBuilder {
        WriteRequestBuilder {
            register: None,
            value: None,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn register(&self) -> HoldingRegister {
        self.register
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn check(&self) -> u16 {
        self.check
    }

    /// Encode the inner PDU: function code, register address, value and
    /// trailing check code, big-endian throughout.
    pub fn encode(&self) -> Vec<u8> {
        let address = self.register.address();
        let mut pdu = Vec::with_capacity(7);
        pdu.push(WRITE_SINGLE_REGISTER);
        pdu.push((address >> 8) as u8);
        pdu.push(address as u8);
        pdu.push((self.value >> 8) as u8);
        pdu.push(self.value as u8);
        pdu.push((self.check >> 8) as u8);
        pdu.push(self.check as u8);
        pdu
    }

    /// Decode a PDU positioned at the inner function code into a
    /// response-tagged command.
    ///
    /// The trailing check code is read as-is: how the device derives it for
    /// responses is not understood, so no verification is attempted here.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        if payload.len() < 7 {
            return Err(DecodeError::PayloadTooShort {
                expected: 7,
                actual: payload.len(),
            });
        }
        if payload[0] != WRITE_SINGLE_REGISTER {
            return Err(DecodeError::UnexpectedFunctionCode {
                expected: WRITE_SINGLE_REGISTER,
                actual: payload[0],
            });
        }

        let address = u16::from_be_bytes([payload[1], payload[2]]);
        let register = HoldingRegister::try_from(address)
            .map_err(|_| DecodeError::UnknownRegister(address))?;
        let value = u16::from_be_bytes([payload[3], payload[4]]);
        let check = u16::from_be_bytes([payload[5], payload[6]]);

        Ok(WriteHoldingRegisterCommand {
            direction: Direction::Response,
            register,
            value,
            check,
        })
    }

    /// The response this request expects back. The check code is carried
    /// over from the request since response check derivation is unknown.
    pub fn expected_response(&self) -> Self {
        WriteHoldingRegisterCommand {
            direction: Direction::Response,
            ..*self
        }
    }

    /// Sanity-check a decoded response. A response reports what the device
    /// already did, so an unsafe register cannot be rejected after the fact;
    /// it is logged instead.
    pub fn validate_response(&self) {
        if !self.register.is_write_safe() {
            warn!(
                "{:?} ({:#06x} -> {:#06x}) is not safe for writing",
                self.register,
                self.register.address(),
                self.value
            );
        }
    }
}

/// Check code over the function code, register address and value.
fn check_code(register: HoldingRegister, value: u16) -> u16 {
    let address = register.address();
    calculate_crc(&[
        WRITE_SINGLE_REGISTER,
        (address >> 8) as u8,
        address as u8,
        (value >> 8) as u8,
        value as u8,
    ])
}

/// CRC-16/MODBUS: init 0xFFFF, reflected polynomial 0xA001.
fn calculate_crc(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if (crc & 0x0001) != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}
