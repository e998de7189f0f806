pub mod bonds;

pub use bonds::{
    calculate_bond_price, calculate_bond_yield, price_from_yield, yield_from_price,
    yield_from_price_explain, yield_from_price_with, BondPriceInput, BondPriceOutput,
    BondYieldInput, BondYieldOutput, YIELD_CEILING, YIELD_FLOOR,
};
