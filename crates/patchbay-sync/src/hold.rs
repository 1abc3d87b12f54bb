//! Parameter holds for the additive-value rule.
//!
//! A signal connected to a control parameter is summed with the parameter's
//! intrinsic value. To make a connected parameter follow its input exactly,
//! the first connection into a parameter saves its intrinsic value and zeroes
//! it; the last disconnection writes the saved value back. Holds are
//! refcounted per parameter, so repeated or overlapping connections never
//! drift the restored value.

use std::collections::HashMap;

use patchbay_core::{Host, HostError, ParamRef};

#[derive(Debug, Clone, Copy)]
struct Hold {
    saved: f32,
    count: usize,
}

/// Saved intrinsic values of parameters with live connections.
#[derive(Debug, Default)]
pub(crate) struct ParamHolds {
    holds: HashMap<ParamRef, Hold>,
}

impl ParamHolds {
    /// Registers one more connection into `param`, zeroing it on the first.
    pub(crate) fn acquire(&mut self, param: &ParamRef, host: &mut dyn Host) -> Result<(), HostError> {
        if let Some(hold) = self.holds.get_mut(param) {
            hold.count += 1;
            return Ok(());
        }

        let saved = host
            .param_value(param)
            .ok_or_else(|| HostError::UnknownParameter {
                node: param.node,
                name: param.name.clone(),
            })?;
        host.set_param_value(param, 0.0)?;
        tracing::debug!(node = %param.node, param = %param.name, saved, "parameter held");
        self.holds.insert(param.clone(), Hold { saved, count: 1 });
        Ok(())
    }

    /// Drops one connection from `param`, restoring it after the last.
    pub(crate) fn release(&mut self, param: &ParamRef, host: &mut dyn Host) -> Result<(), HostError> {
        let Some(hold) = self.holds.get_mut(param) else {
            return Ok(());
        };
        hold.count -= 1;
        if hold.count > 0 {
            return Ok(());
        }

        let saved = hold.saved;
        self.holds.remove(param);
        tracing::debug!(node = %param.node, param = %param.name, saved, "parameter restored");
        host.set_param_value(param, saved)
    }

    /// Returns the saved value of a held parameter.
    pub(crate) fn saved(&self, param: &ParamRef) -> Option<f32> {
        self.holds.get(param).map(|hold| hold.saved)
    }

    pub(crate) fn clear(&mut self) {
        self.holds.clear();
    }
}
