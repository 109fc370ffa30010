//! The slice of the holding-register catalog this crate depends on.
//!
//! The full telemetry catalog lives with the register-metadata layer; the
//! codec only needs register identity (address, equality, hashing) and
//! membership in the write-safe allow-list. Read-only registers appear here
//! so callers attempting to mutate them get a typed refusal instead of a
//! lookup failure.

use std::collections::HashSet;
use std::sync::LazyLock;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Inverter holding registers, keyed by their on-wire address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum HoldingRegister {
    DeviceTypeCode = 0,
    InverterModuleH = 1,
    InverterModuleL = 2,
    NumMpptAndNumPhases = 3,
    GridPortMaxOutputPower = 13,
    EnableChargeTarget = 20,
    BatteryPowerMode = 27,
    SystemTimeYear = 35,
    SystemTimeMonth = 36,
    SystemTimeDay = 37,
    SystemTimeHour = 38,
    SystemTimeMinute = 39,
    SystemTimeSecond = 40,
    ChargeSlot2Start = 41,
    ChargeSlot2End = 42,
    DischargeSlot2Start = 44,
    DischargeSlot2End = 45,
    DischargeSlot1Start = 56,
    DischargeSlot1End = 57,
    EnableDischarge = 59,
    ChargeSlot1Start = 94,
    ChargeSlot1End = 95,
    EnableCharge = 96,
    BatterySocReserve = 110,
    BatteryChargeLimit = 111,
    BatteryDischargeLimit = 112,
    BatteryDischargeMinPowerReserve = 114,
    ChargeTargetSoc = 116,
}

impl HoldingRegister {
    /// On-wire register address.
    pub fn address(self) -> u16 {
        self.into()
    }

    /// Look a register up by its conventional catalog name.
    pub fn from_name(name: &str) -> Option<Self> {
        let register = match name {
            "DEVICE_TYPE_CODE" => Self::DeviceTypeCode,
            "INVERTER_MODULE_H" => Self::InverterModuleH,
            "INVERTER_MODULE_L" => Self::InverterModuleL,
            "NUM_MPPT_AND_NUM_PHASES" => Self::NumMpptAndNumPhases,
            "GRID_PORT_MAX_OUTPUT_POWER" => Self::GridPortMaxOutputPower,
            "ENABLE_CHARGE_TARGET" => Self::EnableChargeTarget,
            "BATTERY_POWER_MODE" => Self::BatteryPowerMode,
            "SYSTEM_TIME_YEAR" => Self::SystemTimeYear,
            "SYSTEM_TIME_MONTH" => Self::SystemTimeMonth,
            "SYSTEM_TIME_DAY" => Self::SystemTimeDay,
            "SYSTEM_TIME_HOUR" => Self::SystemTimeHour,
            "SYSTEM_TIME_MINUTE" => Self::SystemTimeMinute,
            "SYSTEM_TIME_SECOND" => Self::SystemTimeSecond,
            "CHARGE_SLOT_2_START" => Self::ChargeSlot2Start,
            "CHARGE_SLOT_2_END" => Self::ChargeSlot2End,
            "DISCHARGE_SLOT_2_START" => Self::DischargeSlot2Start,
            "DISCHARGE_SLOT_2_END" => Self::DischargeSlot2End,
            "DISCHARGE_SLOT_1_START" => Self::DischargeSlot1Start,
            "DISCHARGE_SLOT_1_END" => Self::DischargeSlot1End,
            "ENABLE_DISCHARGE" => Self::EnableDischarge,
            "CHARGE_SLOT_1_START" => Self::ChargeSlot1Start,
            "CHARGE_SLOT_1_END" => Self::ChargeSlot1End,
            "ENABLE_CHARGE" => Self::EnableCharge,
            "BATTERY_SOC_RESERVE" => Self::BatterySocReserve,
            "BATTERY_CHARGE_LIMIT" => Self::BatteryChargeLimit,
            "BATTERY_DISCHARGE_LIMIT" => Self::BatteryDischargeLimit,
            "BATTERY_DISCHARGE_MIN_POWER_RESERVE" => Self::BatteryDischargeMinPowerReserve,
            "CHARGE_TARGET_SOC" => Self::ChargeTargetSoc,
            _ => return None,
        };
        Some(register)
    }

    /// Whether mutating this register is considered operationally safe.
    pub fn is_write_safe(self) -> bool {
        WRITE_SAFE_REGISTERS.contains(&self)
    }
}

/// Canonical list of registers that are safe to write to. Built once at
/// first use and shared read-only for the life of the process.
pub static WRITE_SAFE_REGISTERS: LazyLock<HashSet<HoldingRegister>> = LazyLock::new(|| {
    HashSet::from([
        HoldingRegister::BatteryChargeLimit,
        HoldingRegister::BatteryDischargeLimit,
        HoldingRegister::BatteryDischargeMinPowerReserve,
        HoldingRegister::BatteryPowerMode,
        HoldingRegister::BatterySocReserve,
        HoldingRegister::ChargeSlot1End,
        HoldingRegister::ChargeSlot1Start,
        HoldingRegister::ChargeSlot2End,
        HoldingRegister::ChargeSlot2Start,
        HoldingRegister::ChargeTargetSoc,
        HoldingRegister::DischargeSlot1End,
        HoldingRegister::DischargeSlot1Start,
        HoldingRegister::DischargeSlot2End,
        HoldingRegister::DischargeSlot2Start,
        HoldingRegister::EnableCharge,
        HoldingRegister::EnableChargeTarget,
        HoldingRegister::EnableDischarge,
        HoldingRegister::SystemTimeDay,
        HoldingRegister::SystemTimeHour,
        HoldingRegister::SystemTimeMinute,
        HoldingRegister::SystemTimeMonth,
        HoldingRegister::SystemTimeSecond,
        HoldingRegister::SystemTimeYear,
    ])
});
