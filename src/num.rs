use alloy::primitives::U256;
use fastnum::{
    UD256, bint,
    decimal::{Context, RoundingMode, UnsignedDecimal},
};

/// Decimals of the native currency.
pub const ETHER_DECIMALS: u8 = 18;

/// Fixed-point to decimal converter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Converter {
    decimals: i32,
}

impl Converter {
    pub(crate) fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    pub fn from_unsigned<const N: usize>(&self, value: U256) -> UnsignedDecimal<N> {
        let unscaled = bint::UInt::<N>::from_le_slice(value.as_le_slice())
            .expect("Converter: U256 -> UInt::<N>");
        UnsignedDecimal::<N>::from_parts(
            unscaled,
            -self.decimals,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }

    pub fn to_unsigned<const N: usize>(&self, value: UnsignedDecimal<N>) -> U256 {
        let rescaled = value.rescale(self.decimals as i16);
        U256::from_le_slice(rescaled.digits().to_radix_le(256).as_slice())
    }
}

/// Parses a decimal ether amount (`"0.05"`) into wei.
///
/// Returns `None` for anything that is not a non-negative decimal, carries
/// more than 18 fractional digits or does not fit into 256 bits of wei.
pub fn parse_ether(value: &str) -> Option<U256> {
    let converter = Converter::new(ETHER_DECIMALS);
    let amount = UD256::from_str(value.trim(), Context::default()).ok()?;
    if amount > converter.from_unsigned(U256::MAX) {
        return None;
    }
    let wei = converter.to_unsigned(amount);
    (converter.from_unsigned::<4>(wei) == amount).then_some(wei)
}

/// Converts a wei amount into ether.
pub fn format_ether(wei: U256) -> UD256 {
    Converter::new(ETHER_DECIMALS).from_unsigned(wei)
}
