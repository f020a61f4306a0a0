use crate::{correction::CorrectionSettings, error::Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_WORKING_DIR: &str = "data/hgnc";
pub const DEFAULT_TABLE_FILE_NAME: &str = "hgnc_downloads.txt";
pub const DEFAULT_CORRECTION_LOG_FILE_NAME: &str = "rescue_history.txt";
pub const WORKING_DIR_ENV: &str = "GENE_XREF_DIR";
/// HGNC custom download: approved and withdrawn protein-coding genes with the columns the
/// default registry reads.
pub const DEFAULT_TABLE_URL: &str = "http://www.genenames.org/cgi-bin/hgnc_downloads?col=gd_hgnc_id&col=gd_app_sym&col=gd_app_name&col=gd_status&col=gd_prev_sym&col=gd_aliases&col=gd_pub_chrom_map&col=gd_pub_acc_ids&col=gd_pub_refseq_ids&col=md_eg_id&col=md_refseq_id&col=md_prot_id&col=md_ensembl_id&status=Approved&status=Entry+Withdrawn&status_opt=2&where=%28%28gd_pub_chrom_map+not+like+%27%25patch%25%27+and+gd_pub_chrom_map+not+like+%27%25ALT_REF%25%27%29+or+gd_pub_chrom_map+IS+NULL%29+and+gd_locus_group+%3D+%27protein-coding+gene%27&order_by=gd_hgnc_id&format=text&limit=&hgnc_dbtag=on&submit=submit";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XrefConfig {
    pub working_dir: PathBuf,
    pub table_url: String,
    pub table_file_name: String,
    pub correction_log_file_name: String,
    pub correction: CorrectionSettings,
}

impl Default for XrefConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from(DEFAULT_WORKING_DIR),
            table_url: DEFAULT_TABLE_URL.to_string(),
            table_file_name: DEFAULT_TABLE_FILE_NAME.to_string(),
            correction_log_file_name: DEFAULT_CORRECTION_LOG_FILE_NAME.to_string(),
            correction: CorrectionSettings::default(),
        }
    }
}

impl XrefConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Reads `path` when given, otherwise starts from the defaults; `GENE_XREF_DIR` then
    /// overrides the working directory.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        if let Some(dir) = std::env::var(WORKING_DIR_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            config.working_dir = PathBuf::from(dir.trim());
        }
        Ok(config)
    }

    pub fn table_path(&self) -> PathBuf {
        self.working_dir.join(&self.table_file_name)
    }

    pub fn correction_log_path(&self) -> PathBuf {
        self.working_dir.join(&self.correction_log_file_name)
    }
}
