//! Collinear blocks by single linkage, and stitching of blocks that an
//! inversion split apart.

use crate::libs::error::SyntenyError;
use crate::libs::genes::GeneOrder;
use crate::libs::grouper::Grouper;
use crate::libs::io::parse_score;
use crate::libs::score::SyntenyRecord;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// An anchor on the rank grid, carrying its synteny score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub pos_a: i64,
    pub pos_b: i64,
    pub score: f64,
}

/// Anchors of one chromosome pair that chain together.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    pub chr_a: String,
    pub chr_b: String,
    pub anchors: Vec<Anchor>,
}

impl Cluster {
    pub fn score(&self) -> f64 {
        self.anchors.iter().map(|a| a.score).sum()
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    fn sort(&mut self) {
        sort_anchors(&mut self.anchors);
    }

    pub fn write(&self, writer: &mut dyn Write, title: &str) -> std::io::Result<()> {
        writeln!(writer, "# {} score {:.3}", title, self.score())?;
        for a in &self.anchors {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{:.3}",
                self.chr_a, a.pos_a, self.chr_b, a.pos_b, a.score
            )?;
        }
        Ok(())
    }
}

fn sort_anchors(anchors: &mut [Anchor]) {
    anchors.sort_by(|a, b| {
        (a.pos_a, a.pos_b)
            .cmp(&(b.pos_a, b.pos_b))
            .then(a.score.total_cmp(&b.score))
    });
}

/// Single linkage under a Manhattan ball of radius `max_dist`.
///
/// Points are sorted by `pos_a`; each one looks back until the x distance
/// alone exceeds `max_dist`, joining every point within the ball. Groups
/// smaller than `min_size` are dropped. Members come out sorted, clusters
/// ordered by their first member.
pub fn single_linkage(points: &mut [Anchor], max_dist: i64, min_size: usize) -> Vec<Vec<Anchor>> {
    sort_anchors(points);

    let mut clusters = Grouper::new();
    for i in 0..points.len() {
        clusters.add(i);
        for j in (0..i).rev() {
            let del_x = points[i].pos_a - points[j].pos_a;
            if del_x > max_dist {
                break;
            }
            let del_y = (points[i].pos_b - points[j].pos_b).abs();
            if del_x + del_y > max_dist {
                continue;
            }
            clusters.join(i, j);
        }
    }

    let mut groups: Vec<Vec<usize>> = clusters
        .groups()
        .filter(|g| g.len() >= min_size)
        .map(|g| {
            let mut g = g.clone();
            g.sort_unstable();
            g
        })
        .collect();
    groups.sort_by_key(|g| g[0]);

    groups
        .into_iter()
        .map(|g| g.into_iter().map(|i| points[i]).collect())
        .collect()
}

/// Anchors with `synteny_score >= cutoff`, grouped by chromosome pair.
///
/// Self comparisons keep the lower triangle only.
pub fn collect_points(
    records: &[SyntenyRecord],
    genes1: &GeneOrder,
    genes2: &GeneOrder,
    self_match: bool,
    cutoff: f64,
) -> BTreeMap<(String, String), Vec<Anchor>> {
    let mut points: BTreeMap<(String, String), Vec<Anchor>> = BTreeMap::new();
    let mut skipped = 0;

    for record in records {
        if record.synteny_score < cutoff {
            continue;
        }
        let (Some(locus_a), Some(locus_b)) =
            (genes1.locus(&record.gene_a), genes2.locus(&record.gene_b))
        else {
            skipped += 1;
            continue;
        };
        if self_match && locus_a > locus_b {
            continue;
        }

        points
            .entry((locus_a.0.clone(), locus_b.0.clone()))
            .or_default()
            .push(Anchor {
                pos_a: locus_a.1,
                pos_b: locus_b.1,
                score: record.synteny_score,
            });
    }

    if skipped > 0 {
        log::debug!("{} records skipped, genes not in gene order", skipped);
    }
    points
}

/// Runs single linkage on every chromosome pair, in key order.
pub fn cluster_points(
    points: BTreeMap<(String, String), Vec<Anchor>>,
    max_dist: i64,
    min_size: usize,
) -> Vec<Cluster> {
    let mut clusters = vec![];
    for ((chr_a, chr_b), mut anchors) in points {
        log::debug!("{} vs {}: {} anchors", chr_a, chr_b, anchors.len());
        for members in single_linkage(&mut anchors, max_dist, min_size) {
            clusters.push(Cluster {
                chr_a: chr_a.clone(),
                chr_b: chr_b.clone(),
                anchors: members,
            });
        }
    }
    clusters
}

// Smallest gap between the extremes of two ranges, or unchainable when the
// chromosomes differ
fn axis_distance(chr_i: &str, chr_j: &str, i: (i64, i64), j: (i64, i64), nmax: i64) -> i64 {
    if chr_i != chr_j {
        return nmax + 1;
    }
    [(i.0 - j.1), (i.1 - j.0), (i.0 - j.0), (i.1 - j.1)]
        .iter()
        .map(|d| d.abs())
        .min()
        .unwrap_or(nmax + 1)
}

fn extent(values: impl Iterator<Item = i64>) -> (i64, i64) {
    values.fold((i64::MAX, i64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

pub fn distance_x(ci: &Cluster, cj: &Cluster, nmax: i64) -> i64 {
    axis_distance(
        &ci.chr_a,
        &cj.chr_a,
        extent(ci.anchors.iter().map(|a| a.pos_a)),
        extent(cj.anchors.iter().map(|a| a.pos_a)),
        nmax,
    )
}

pub fn distance_y(ci: &Cluster, cj: &Cluster, nmax: i64) -> i64 {
    axis_distance(
        &ci.chr_b,
        &cj.chr_b,
        extent(ci.anchors.iter().map(|a| a.pos_b)),
        extent(cj.anchors.iter().map(|a| a.pos_b)),
        nmax,
    )
}

/// One round of block merging.
///
/// `chain` holds indices into `clusters`. Clusters adjacent on both axes are
/// grouped; each group is represented by its smallest index, which receives
/// the anchors of the others. Returns the shortened chain and whether
/// anything merged.
pub fn merge_clusters(chain: &[usize], clusters: &mut [Cluster], nmax: i64) -> (Vec<usize>, bool) {
    let mut mergeables = Grouper::new();
    for j in 0..chain.len() {
        let cj = chain[j];
        mergeables.add(cj);
        for i in (0..j).rev() {
            let ci = chain[i];
            let del_x = distance_x(&clusters[ci], &clusters[cj], nmax);
            if del_x > nmax {
                continue;
            }
            let del_y = distance_y(&clusters[ci], &clusters[cj], nmax);
            if del_x + del_y > nmax {
                continue;
            }
            mergeables.join(ci, cj);
        }
    }

    let parent_of = |c: usize| -> usize {
        mergeables
            .group(&c)
            .and_then(|g| g.iter().min().copied())
            .unwrap_or(c)
    };

    let merged_chain: Vec<usize> = chain.iter().copied().filter(|&c| parent_of(c) == c).collect();

    for &c in chain {
        let parent = parent_of(c);
        if parent != c {
            let moved = clusters[c].anchors.clone();
            clusters[parent].anchors.extend(moved);
        }
    }
    for &c in &merged_chain {
        clusters[c].sort();
    }

    let updated = merged_chain.len() != chain.len();
    (merged_chain, updated)
}

/// Merges until a full round changes nothing. Returns the final chain.
pub fn recursive_merge_clusters(clusters: &mut [Cluster], nmax: i64) -> Vec<usize> {
    let mut chain: Vec<usize> = (0..clusters.len()).collect();
    let mut round = 0;
    loop {
        round += 1;
        let (merged, updated) = merge_clusters(&chain, clusters, nmax);
        log::debug!("merging round {}: {} -> {} blocks", round, chain.len(), merged.len());
        chain = merged;
        if !updated {
            break;
        }
    }
    chain
}

/// Reads clusters written by [`Cluster::write`], whatever their title.
pub fn read_clusters(path: &str) -> anyhow::Result<Vec<Cluster>> {
    log::info!("Import {}", path);
    let reader = crate::reader(path)?;
    let clusters = read_clusters_from(path, reader)?;
    if clusters.is_empty() {
        return Err(SyntenyError::EmptyInput(path.to_string()).into());
    }
    Ok(clusters)
}

pub fn read_clusters_from<R: BufRead>(path: &str, reader: R) -> anyhow::Result<Vec<Cluster>> {
    let mut clusters: Vec<Cluster> = vec![];
    let mut current: Option<Cluster> = None;
    let mut in_cluster = false;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') {
            if let Some(c) = current.take() {
                clusters.push(c);
            }
            in_cluster = true;
            continue;
        }
        if !in_cluster {
            return Err(SyntenyError::parse(path, i + 1, "anchor before any cluster header").into());
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(SyntenyError::parse(
                path,
                i + 1,
                format!("expected 5 fields, found {}", fields.len()),
            )
            .into());
        }
        let invalid = |s: &str| SyntenyError::parse(path, i + 1, format!("invalid number {}", s));
        let anchor = Anchor {
            pos_a: fields[1].parse().map_err(|_| invalid(fields[1]))?,
            pos_b: fields[3].parse().map_err(|_| invalid(fields[3]))?,
            score: parse_score(path, i + 1, fields[4])?,
        };

        let cluster = current.get_or_insert_with(|| Cluster {
            chr_a: fields[0].to_string(),
            chr_b: fields[2].to_string(),
            anchors: vec![],
        });
        if cluster.chr_a != fields[0] || cluster.chr_b != fields[2] {
            return Err(SyntenyError::parse(
                path,
                i + 1,
                format!(
                    "cluster mixes chromosome pairs {}/{} and {}/{}",
                    cluster.chr_a, cluster.chr_b, fields[0], fields[2]
                ),
            )
            .into());
        }
        cluster.anchors.push(anchor);
    }
    if let Some(c) = current.take() {
        clusters.push(c);
    }

    for c in clusters.iter_mut() {
        c.sort();
    }
    Ok(clusters)
}
