//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{backprop::GradStore, DType, Tensor, Var};
use candle_nn::VarMap;
use log::trace;
use std::sync::PoisonError;

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> i64;

    /// Sets the  output dimension.
    fn set_out_dim(&mut self, v: i64);
}

/// Copies all variables of `src` into `dest`.
///
/// Variables are identified by their names. After the copy, each variable
/// of `dest` equals the one in `src` bit for bit.
pub fn copy_varmap(dest: &VarMap, src: &VarMap) -> Result<()> {
    let dest = dest.data().lock().map_err(lock_error)?;
    let src = src.data().lock().map_err(lock_error)?;

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .ok_or_else(|| anyhow!("Variable {} is missing in the source", k_dest))?;
        trace!("Copy {}", k_dest);
        v_dest.set(v_src.as_tensor())?;
    }

    Ok(())
}

fn lock_error<T>(_: PoisonError<T>) -> anyhow::Error {
    anyhow!("VarMap lock is poisoned")
}

/// Clamps the gradient of each variable to `[-clip, clip]` element-wise.
///
/// Variables without gradient are left alone.
pub fn clamp_grads(grads: &mut GradStore, vars: &[Var], clip: f64) -> Result<()> {
    for var in vars.iter() {
        let clamped = match grads.get(var.as_tensor()) {
            Some(g) => g.clamp(-clip, clip)?,
            None => continue,
        };
        grads.insert(var.as_tensor(), clamped);
    }
    Ok(())
}

/// See <https://pytorch.org/docs/stable/generated/torch.nn.SmoothL1Loss.html>.
///
/// Quadratic for `|x - y| <= 1`, linear beyond, averaged over all elements.
pub fn smooth_l1_loss(x: &Tensor, y: &Tensor) -> Result<Tensor, candle_core::Error> {
    let d = (x - y)?.abs()?;
    let m1 = d.le(1.0)?.to_dtype(DType::F32)?;
    let m2 = (1.0 - &m1)?;
    (((0.5 * m1)? * d.powf(2.0))? + m2 * (d - 0.5))?.mean_all()
}

/// Index of the largest value, the lowest index on ties.
///
/// Returns `None` for an empty slice.
pub fn argmax_first(vs: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in vs.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// One-step TD targets `r + gamma * v(s')`.
///
/// `next_values` holds the values of non-terminal next states in the order
/// of `non_terminal_ixs`; all the other entries take zero as next value.
pub fn td_targets(
    reward: &[f32],
    non_terminal_ixs: &[usize],
    next_values: &[f32],
    gamma: f64,
) -> Result<Vec<f32>> {
    if non_terminal_ixs.len() != next_values.len() {
        return Err(anyhow!(
            "{} next values for {} non-terminal entries",
            next_values.len(),
            non_terminal_ixs.len()
        ));
    }

    let mut next = vec![0f32; reward.len()];
    for (&ix, &v) in non_terminal_ixs.iter().zip(next_values.iter()) {
        *next
            .get_mut(ix)
            .ok_or_else(|| anyhow!("Index {} out of the batch", ix))? = v;
    }

    Ok(reward
        .iter()
        .zip(next.iter())
        .map(|(r, v)| r + gamma as f32 * v)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use candle_nn::Init;

    fn varmap(vs: &[f32]) -> Result<VarMap> {
        let vm = VarMap::new();
        let init = Init::Randn {
            mean: 0.0,
            stdev: 1.0,
        };
        vm.get((vs.len(),), "var1", init, DType::F32, &Device::Cpu)?;
        let t = Tensor::from_slice(vs, (vs.len(),), &Device::Cpu)?;
        vm.data().lock().unwrap().get("var1").unwrap().set(&t)?;
        Ok(vm)
    }

    fn values(vm: &VarMap) -> Vec<f32> {
        vm.data()
            .lock()
            .unwrap()
            .get("var1")
            .unwrap()
            .as_tensor()
            .to_vec1()
            .unwrap()
    }

    #[test]
    fn test_copy_varmap() -> Result<()> {
        let src = varmap(&[1.0, -2.5, 3.25e-7])?;
        let dest = varmap(&[4.0, 5.0, 6.0])?;
        copy_varmap(&dest, &src)?;

        let vs = values(&dest);
        let bits = |vs: &[f32]| vs.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&vs), bits(&values(&src)));

        // The copy does not alias the source.
        let t = Tensor::from_slice(&[0f32, 0.0, 0.0], (3,), &Device::Cpu)?;
        src.data().lock().unwrap().get("var1").unwrap().set(&t)?;
        assert_eq!(values(&dest), vs);
        Ok(())
    }

    #[test]
    fn test_smooth_l1_loss() -> Result<()> {
        let x = Tensor::from_slice(&[0.5f32], (1,), &Device::Cpu)?;
        let y = Tensor::from_slice(&[1.0f32], (1,), &Device::Cpu)?;
        let loss: f32 = smooth_l1_loss(&x, &y)?.to_scalar()?;
        assert!((loss - 0.125).abs() < 1e-7);

        let x = Tensor::from_slice(&[0.0f32, 3.0], (2,), &Device::Cpu)?;
        let y = Tensor::from_slice(&[0.0f32, 0.0], (2,), &Device::Cpu)?;
        let loss: f32 = smooth_l1_loss(&x, &y)?.to_scalar()?;
        assert!((loss - 1.25).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_argmax_first() {
        assert_eq!(argmax_first(&[0.1, 0.7, 0.7, 0.2]), Some(1));
        assert_eq!(argmax_first(&[1.0, 1.0]), Some(0));
        assert_eq!(argmax_first(&[-3.0, -1.0]), Some(1));
        assert_eq!(argmax_first(&[]), None);
    }

    #[test]
    fn test_td_targets() -> Result<()> {
        let targets = td_targets(&[1.0, 1.0, 1.0], &[1], &[2.0], 0.5)?;
        assert_eq!(targets, vec![1.0, 2.0, 1.0]);

        // All terminal.
        let targets = td_targets(&[1.0, 0.5], &[], &[], 0.999)?;
        assert_eq!(targets, vec![1.0, 0.5]);

        assert!(td_targets(&[1.0], &[0], &[], 0.9).is_err());
        Ok(())
    }

    #[test]
    fn test_clamp_grads() -> Result<()> {
        let var = Var::from_tensor(&Tensor::from_slice(&[1f32, 2.0], (2,), &Device::Cpu)?)?;
        let loss = (var.as_tensor() * 10.0)?.sum_all()?;
        let mut grads = loss.backward()?;
        clamp_grads(&mut grads, &[var.clone()], 1.0)?;
        let g: Vec<f32> = grads.get(var.as_tensor()).unwrap().to_vec1()?;
        assert_eq!(g, vec![1.0, 1.0]);
        Ok(())
    }
}
