use serde::{Deserialize, Serialize};

/// Gas oracle reading, prices in gwei.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GasOracle {
    pub last_block: u64,
    pub safe_gas_price: f64,
    pub propose_gas_price: f64,
    pub fast_gas_price: f64,
    pub suggested_base_fee: f64,
}
