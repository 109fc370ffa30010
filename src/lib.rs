// lib.rs

mod framer;
mod register;
mod write_register;

pub use register::{HoldingRegister, WRITE_SAFE_REGISTERS};

pub use framer::{Framer, HEADER_SIZE};
pub use write_register::{
    DecodeError, Direction, ValidationError, WriteHoldingRegisterCommand, WriteRequestBuilder,
};
pub use write_register::{DUMMY_SERIAL, SLAVE_ADDRESS, WRITE_SINGLE_REGISTER};

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error(
        "Unexpected MBAP header; likely corruption so aborting processing \
         ({tid:#06x} {pid:#06x} {uid:#04x}{fid:02x} != 0x5959 0x0001 0x0102)"
    )]
    Corruption { tid: u16, pid: u16, uid: u8, fid: u8 },
}
