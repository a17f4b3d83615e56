/// Average ranks (1-based) of `values`, ties sharing the mean of their
/// positions, together with the size of every tie block.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub ranks: Vec<f64>,
    pub tie_sizes: Vec<usize>,
}

impl Ranking {
    /// `sum(t^3 - t)` over tie blocks.
    pub fn tie_sum(&self) -> f64 {
        self.tie_sizes
            .iter()
            .filter(|&&t| t > 1)
            .map(|&t| {
                let t = t as f64;
                t * t * t - t
            })
            .sum()
    }
}

pub fn rank_average(values: &[f64]) -> Ranking {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut tie_sizes = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold ranks start+1 ..= end
        let average = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = average;
        }
        tie_sizes.push(end - start);
        start = end;
    }
    Ranking { ranks, tie_sizes }
}
