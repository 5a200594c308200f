//! Chain boundaries of a chain-concatenated sequence such as `"MHC/PEPTIDE/TCRA/TCRB"`.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainBoundaries {
    starts: Vec<usize>,
    stops: Vec<usize>,
}

impl ChainBoundaries {
    /// Split on `/` and accumulate chain lengths. Stops are exclusive.
    pub fn from_chainseq(chainseq: &str) -> Self {
        let stops: Vec<usize> = chainseq
            .split('/')
            .scan(0, |acc, chain| {
                *acc += chain.chars().count();
                Some(*acc)
            })
            .collect();
        let starts = std::iter::once(0)
            .chain(stops[..stops.len() - 1].iter().copied())
            .collect();
        Self { starts, stops }
    }

    /// Total residues across all chains.
    pub fn nres(&self) -> usize {
        self.stops.last().copied().unwrap_or(0)
    }

    /// Residue index range of each chain, in chain order.
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.starts.iter().zip(&self.stops).map(|(&a, &b)| a..b)
    }
}
