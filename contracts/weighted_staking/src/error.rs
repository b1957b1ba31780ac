use curve::CurveError;
use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    StakingDisabled = 800,
    InvalidAmount = 801,
    NoActivePosition = 802,
    DuplicatePosition = 803,
    UnknownStream = 804,
    InvalidSchedule = 805,
    TransferFailed = 806,
    Unauthorized = 807,
    InvalidLockDuration = 808,
    InvalidWeightCurve = 809,
    InvalidPenaltyBps = 810,
    InvalidDecimals = 811,
    ContractMathError = 812,
    AdminNotSet = 813,
    ConfigNotSet = 814,
    TooManyRewardStreams = 815,
}

impl From<CurveError> for ContractError {
    fn from(_: CurveError) -> Self {
        ContractError::InvalidWeightCurve
    }
}
