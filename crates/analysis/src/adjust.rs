use common::config::PValueAdjustment;

/// Family-wise correction of `p_values`, returned in input order and capped
/// at 1.
pub fn adjust_p_values(p_values: &[f64], method: PValueAdjustment) -> Vec<f64> {
    let m = p_values.len() as f64;
    match method {
        PValueAdjustment::None => p_values.to_vec(),
        PValueAdjustment::Bonferroni => p_values.iter().map(|p| (p * m).min(1.0)).collect(),
        PValueAdjustment::Sidak => p_values
            .iter()
            .map(|p| (1.0 - (1.0 - p).powf(m)).min(1.0))
            .collect(),
        PValueAdjustment::Holm => {
            let mut order: Vec<usize> = (0..p_values.len()).collect();
            order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));
            let mut adjusted = vec![0.0; p_values.len()];
            let mut running = 0.0_f64;
            for (step, &idx) in order.iter().enumerate() {
                let scaled = ((m - step as f64) * p_values[idx]).min(1.0);
                running = running.max(scaled);
                adjusted[idx] = running;
            }
            adjusted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-12)
    }

    #[test]
    fn none_is_identity() {
        assert_eq!(adjust_p_values(&[0.2, 0.01], PValueAdjustment::None), vec![0.2, 0.01]);
    }

    #[test]
    fn bonferroni_caps_at_one() {
        let adjusted = adjust_p_values(&[0.01, 0.04, 0.5], PValueAdjustment::Bonferroni);
        assert!(close(&adjusted, &[0.03, 0.12, 1.0]));
    }

    #[test]
    fn holm_is_monotone_step_down() {
        let adjusted = adjust_p_values(&[0.04, 0.01, 0.03], PValueAdjustment::Holm);
        // sorted: 0.01*3=0.03, 0.03*2=0.06, 0.04*1=0.04 -> max-accumulated 0.06
        assert!(close(&adjusted, &[0.06, 0.03, 0.06]));
    }

    #[test]
    fn sidak_matches_closed_form() {
        let adjusted = adjust_p_values(&[0.05, 0.05], PValueAdjustment::Sidak);
        assert!(close(&adjusted, &[0.0975, 0.0975]));
    }
}
