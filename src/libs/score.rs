//! Synteny score: an anchor's own c-score plus the weighted support of the
//! anchors around it.
//!
//! Neighbors are split into the four quadrants around the anchor and only the
//! strongest quadrant counts. Collinear support piles up along one diagonal,
//! while hits scattered over opposite quadrants are noise.

use crate::libs::cscore::ScoredPair;
use crate::libs::error::SyntenyError;
use crate::libs::genes::GeneOrder;
use crate::libs::io::parse_score;
use crate::libs::kdtree::KdTree;
use crate::libs::params::Params;
use rayon::prelude::*;
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::BTreeMap;
use std::io::Write;

/// A scored pair placed on the rank grid of one chromosome pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorPoint {
    pub pos_a: i64,
    pub pos_b: i64,
    pub cscore: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SyntenyRecord {
    pub gene_a: String,
    pub gene_b: String,
    pub cscore: f64,
    pub synteny_score: f64,
}

impl SyntenyRecord {
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{:.3}\t{:.3}",
            self.gene_a, self.gene_b, self.cscore, self.synteny_score
        )
    }
}

/// Anchors of one chromosome pair, with the genes behind each of them.
#[derive(Clone, Debug, Default)]
pub struct Bucket {
    pub anchors: Vec<AnchorPoint>,
    pub genes: Vec<(String, String)>,
}

/// Weights for integer distances `0..=nmax`, from a half-normal survival curve
/// with sigma `nmax / 2`: `w(d) = 2 * (1 - cdf(d))`.
///
/// ```
/// let w = synteny::libs::score::normal_weights(40).unwrap();
/// assert_eq!(w.len(), 41);
/// assert!((w[0] - 1.0).abs() < 1e-12);
/// assert!(w[40] < 0.05);
/// ```
pub fn normal_weights(nmax: i64) -> Result<Vec<f64>, SyntenyError> {
    let normal = Normal::new(0.0, (nmax / 2).max(1) as f64)
        .map_err(|e| SyntenyError::Config(format!("invalid weight curve: {}", e)))?;

    Ok((0..=nmax)
        .map(|d| 2.0 * (1.0 - normal.cdf(d as f64)))
        .collect())
}

/// Self c-score plus the heaviest quadrant.
///
/// `neighbors` yields `(dx, dy, dist, cscore)`; neighbors sharing a row or a
/// column with the anchor (itself, tandem copies) are ignored.
pub fn quadrant_score<I>(cscore: f64, neighbors: I, weights: &[f64]) -> f64
where
    I: IntoIterator<Item = (i64, i64, f64, f64)>,
{
    let mut quadrants = [0.0f64; 4];
    let last = weights.len().saturating_sub(1);

    for (dx, dy, dist, neighbor_cscore) in neighbors {
        if dx == 0 || dy == 0 {
            continue;
        }
        let w = weights.get((dist as usize).min(last)).copied().unwrap_or(0.0);
        let q = match (dx > 0, dy > 0) {
            (true, true) => 0,
            (false, true) => 1,
            (false, false) => 2,
            (true, false) => 3,
        };
        quadrants[q] += w * neighbor_cscore;
    }

    cscore + quadrants.iter().cloned().fold(0.0, f64::max)
}

/// Synteny scores of all anchors in one bucket, in anchor order.
pub fn score_bucket(anchors: &[AnchorPoint], weights: &[f64], params: &Params) -> Vec<f64> {
    let coords: Vec<(i64, i64)> = anchors.iter().map(|a| (a.pos_a, a.pos_b)).collect();
    let tree = KdTree::build(&coords);

    anchors
        .iter()
        .map(|anchor| {
            let neighbors = tree
                .nearest(
                    (anchor.pos_a, anchor.pos_b),
                    params.k,
                    params.nmax as f64,
                    params.metric,
                )
                .into_iter()
                .map(|n| {
                    let other = &anchors[n.idx];
                    (
                        other.pos_a - anchor.pos_a,
                        other.pos_b - anchor.pos_b,
                        n.dist,
                        other.cscore,
                    )
                });
            quadrant_score(anchor.cscore, neighbors, weights)
        })
        .collect()
}

/// Groups pairs by chromosome pair. Pairs with a gene missing from its table
/// are skipped; the count of skipped pairs is returned alongside.
pub fn bucket_pairs(
    pairs: &[ScoredPair],
    genes1: &GeneOrder,
    genes2: &GeneOrder,
) -> (BTreeMap<(String, String), Bucket>, usize) {
    let mut buckets: BTreeMap<(String, String), Bucket> = BTreeMap::new();
    let mut skipped = 0;

    for pair in pairs {
        let (Some((chr_a, pos_a)), Some((chr_b, pos_b))) =
            (genes1.locus(&pair.gene_a), genes2.locus(&pair.gene_b))
        else {
            skipped += 1;
            continue;
        };

        let bucket = buckets
            .entry((chr_a.clone(), chr_b.clone()))
            .or_default();
        bucket.anchors.push(AnchorPoint {
            pos_a: *pos_a,
            pos_b: *pos_b,
            cscore: pair.cscore,
        });
        bucket
            .genes
            .push((pair.gene_a.clone(), pair.gene_b.clone()));
    }

    (buckets, skipped)
}

/// Scores every pair against its chromosome-pair neighborhood.
///
/// Buckets are scored in parallel and concatenated in sorted bucket order.
pub fn synteny_scores(
    pairs: &[ScoredPair],
    genes1: &GeneOrder,
    genes2: &GeneOrder,
    params: &Params,
) -> Result<Vec<SyntenyRecord>, SyntenyError> {
    let weights = normal_weights(params.nmax)?;
    let (buckets, skipped) = bucket_pairs(pairs, genes1, genes2);
    if skipped > 0 {
        log::debug!("{} pairs skipped, genes not in gene order", skipped);
    }

    let buckets: Vec<Bucket> = buckets.into_values().collect();
    let scored: Vec<Vec<SyntenyRecord>> = buckets
        .par_iter()
        .map(|bucket| {
            let scores = score_bucket(&bucket.anchors, &weights, params);
            bucket
                .genes
                .iter()
                .zip(bucket.anchors.iter())
                .zip(scores)
                .map(|(((gene_a, gene_b), anchor), synteny_score)| SyntenyRecord {
                    gene_a: gene_a.clone(),
                    gene_b: gene_b.clone(),
                    cscore: anchor.cscore,
                    synteny_score,
                })
                .collect()
        })
        .collect();

    Ok(scored.into_iter().flatten().collect())
}

/// Reads a `.synteny_score` file: `gene_a gene_b cscore synteny_score`.
///
/// A score of `n.a.` is read as `na_value`.
pub fn read_synteny_scores(path: &str, na_value: f64) -> anyhow::Result<Vec<SyntenyRecord>> {
    log::info!("Import {}", path);

    let mut records = vec![];
    for record in crate::libs::io::data_lines(path)? {
        let (line_no, fields) = record?;
        if fields.len() < 3 {
            return Err(SyntenyError::parse(
                path,
                line_no,
                format!("expected at least 3 fields, found {}", fields.len()),
            )
            .into());
        }
        let parse = |s: &str| -> Result<f64, SyntenyError> {
            if s == "n.a." {
                return Ok(na_value);
            }
            parse_score(path, line_no, s)
        };

        let last = fields.len() - 1;
        records.push(SyntenyRecord {
            gene_a: fields[0].clone(),
            gene_b: fields[1].clone(),
            cscore: if last > 2 { parse(&fields[2])? } else { na_value },
            synteny_score: parse(&fields[last])?,
        });
    }

    if records.is_empty() {
        return Err(SyntenyError::EmptyInput(path.to_string()).into());
    }
    Ok(records)
}

pub fn write_synteny_scores(writer: &mut dyn Write, records: &[SyntenyRecord]) -> anyhow::Result<()> {
    for record in records {
        writeln!(writer, "{}", record.to_line())?;
    }
    Ok(())
}
