//! # Tensor-Network Primitives
//!
//! The contraction pattern behind the high-order recurrent cells:
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`augmented_state`] | `[h_{t-L}, ..., h_{t-1}, 1]` from the lag window |
//! | [`outer_product`] | Batched tensor ⊗ vector, one axis at a time |
//! | [`high_order_state`] | Order-way outer power of the augmented state |
//! | [`tt_contract`] | State tensor · tensor-train core chain |
//! | [`tt_contract_factored`] | Same result without forming the state tensor |
//! | [`full_contract`] | State tensor · dense `[D^K, H]` weights (reference) |
//!
//! ## Tensor Shapes
//!
//! With hidden size `H`, `L` lags and order `K`, the augmented state has
//! `D = H * L + 1` entries and the state tensor `D^K`.
//!
//! | Tensor | Shape |
//! |--------|-------|
//! | augmented state | `[batch, D]` |
//! | state tensor (flat) | `[batch, D^K]` |
//! | core `i` | `[r_{i-1}, D, r_i]`, `r_0 = 1`, `r_K = H` |
//! | contraction output | `[batch, H]` |

mod full;
mod outer;
mod tt;

pub use full::{dense_rows, dense_state_len, full_contract, MAX_DENSE_ENTRIES};
pub use outer::{augmented_state, high_order_state, outer_product, StateTensor};
pub use tt::{tt_contract, tt_contract_factored, TtCores, TtLayout};

/// `D = hidden_size * num_lags + 1`, the augmented state length.
pub fn augmented_size(hidden_size: usize, num_lags: usize) -> usize {
    hidden_size * num_lags + 1
}
