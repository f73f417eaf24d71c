use crate::libs::error::SyntenyError;
use std::collections::HashMap;
use std::io::BufRead;

/// Position of a gene after tandem collapsing: chromosome and rank on it.
pub type Locus = (String, i64);

/// Gene order table of one genome.
///
/// One row per gene, seven whitespace separated columns:
///
/// ```text
/// chr gene start stop size tandem_rep chr:rank
/// ```
///
/// Every gene points at its tandem representative; the label column holds
/// the representative's rank, so all members of a tandem group share a locus.
#[derive(Clone, Debug, Default)]
pub struct GeneOrder {
    tandem: HashMap<String, String>,
    loci: HashMap<String, Locus>,
    genes: HashMap<Locus, String>,
}

impl GeneOrder {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        log::info!("Import {}", path);
        let reader = crate::reader(path)?;
        let order = Self::from_reader(path, reader)?;
        if order.is_empty() {
            return Err(SyntenyError::EmptyInput(path.to_string()).into());
        }
        Ok(order)
    }

    pub fn from_reader<R: BufRead>(path: &str, reader: R) -> anyhow::Result<Self> {
        let mut order = GeneOrder::default();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 7 {
                return Err(SyntenyError::parse(
                    path,
                    i + 1,
                    format!("expected 7 fields, found {}", fields.len()),
                )
                .into());
            }

            let chr = fields[0];
            let gene = fields[1];
            let tandem_rep = fields[5];
            let rank = fields[6]
                .rsplit(':')
                .next()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| {
                    SyntenyError::parse(path, i + 1, format!("invalid rank label {}", fields[6]))
                })?;

            order.tandem.insert(gene.to_string(), tandem_rep.to_string());
            let locus = (chr.to_string(), rank);
            if gene == tandem_rep {
                order.genes.insert(locus.clone(), gene.to_string());
            }
            order.loci.insert(gene.to_string(), locus);
        }

        Ok(order)
    }

    /// Number of genes, tandem copies included.
    pub fn len(&self) -> usize {
        self.tandem.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tandem.is_empty()
    }

    pub fn contains(&self, gene: &str) -> bool {
        self.tandem.contains_key(gene)
    }

    pub fn representative(&self, gene: &str) -> Option<&str> {
        self.tandem.get(gene).map(|s| s.as_str())
    }

    pub fn is_representative(&self, gene: &str) -> bool {
        self.representative(gene) == Some(gene)
    }

    pub fn locus(&self, gene: &str) -> Option<&Locus> {
        self.loci.get(gene)
    }

    /// The representative sitting at `locus`.
    pub fn gene_at(&self, locus: &Locus) -> Option<&str> {
        self.genes.get(locus).map(|s| s.as_str())
    }

    /// Iterates over `(gene, locus)` for every gene.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Locus)> {
        self.loci.iter()
    }
}

/// Strips the splice-variant suffix from a transcript id.
///
/// Groups name alternative transcripts inconsistently; most append `.N`,
/// rice uses `-N` and papaya ids (`ev...`) carry no suffix.
///
/// ```
/// use synteny::libs::genes::gene_name;
/// assert_eq!(gene_name("AT1G01010.1"), "AT1G01010");
/// assert_eq!(gene_name("Os01g0100100-01"), "Os01g0100100");
/// assert_eq!(gene_name("evm.model.supercontig_0.1"), "evm.model.supercontig_0.1");
/// assert_eq!(gene_name("GSVIVT00000001001"), "GSVIVT00000001001");
/// ```
pub fn gene_name(id: &str) -> &str {
    if id.starts_with("ev") {
        return id;
    }
    let sep = if id.starts_with("Os") { '-' } else { '.' };
    match id.rsplit_once(sep) {
        Some((name, _)) => name,
        None => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gene_order() {
        let input = "\
chr1 g1 100 200 300 g1 chr1:00000
chr1 g2 300 400 250 g1 chr1:00000
chr1 g3 500 600 120 g3 chr1:00001
# comment

chr2 g4 100 200 80 g4 chr2:00000
";
        let order = GeneOrder::from_reader("test", input.as_bytes()).unwrap();

        assert_eq!(order.len(), 4);
        assert_eq!(order.representative("g2"), Some("g1"));
        assert!(order.is_representative("g1"));
        assert!(!order.is_representative("g2"));
        assert_eq!(order.locus("g2"), Some(&("chr1".to_string(), 0)));
        assert_eq!(order.locus("g3"), Some(&("chr1".to_string(), 1)));
        assert_eq!(order.gene_at(&("chr1".to_string(), 0)), Some("g1"));
        assert_eq!(order.gene_at(&("chr2".to_string(), 0)), Some("g4"));
        assert!(!order.contains("g5"));
    }

    #[test]
    fn test_parse_errors() {
        let input = "chr1 g1 100 200 300 g1\n";
        let err = GeneOrder::from_reader("short.genes", input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("short.genes at line 1"));

        let input = "chr1 g1 100 200 300 g1 chr1:x\n";
        let err = GeneOrder::from_reader("bad.genes", input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("invalid rank label"));
    }
}
