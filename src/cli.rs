use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "rgunzip")]
#[command(version)]
#[command(about = "A Rust gunzip utility for large archives, with HTTP URL support", long_about = None)]
#[command(after_help = "Examples:\n  \
  rgunzip dump.sql.gz                 decompress to dump.sql\n  \
  rgunzip -C -d /tmp logs.gz          decompress into /tmp and verify the CRC32\n  \
  rgunzip -l https://example.com/big.gz   show header info of a remote archive")]
pub struct Cli {
    /// Gzip file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Output file (default: FILE without its .gz suffix)
    #[arg(value_name = "OUTPUT")]
    pub output: Option<String>,

    /// List header and footer information
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely (implies -l)
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Decompress into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Use the original file name stored in the header
    #[arg(short = 'N')]
    pub original_name: bool,

    /// Verify the CRC32 of the output as well as its size
    #[arg(short = 'C')]
    pub verify_crc: bool,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default log filter when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        if self.is_very_quiet() {
            "error"
        } else {
            "warn"
        }
    }

    /// Resolve the destination path.
    ///
    /// `stored_name` is the file name from the gzip header, used with `-N`.
    pub fn output_path(&self, stored_name: Option<&str>) -> PathBuf {
        let name = match (&self.output, stored_name) {
            (Some(output), _) => PathBuf::from(output),
            (None, Some(stored)) if self.original_name => {
                // Never let a stored name escape the output directory
                Path::new(stored)
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| self.default_output_name())
            }
            _ => self.default_output_name(),
        };

        match &self.extract_dir {
            Some(dir) => PathBuf::from(dir).join(name),
            None => name,
        }
    }

    /// Input name with `.gz`/`-gz`/`.z` stripped, `.tgz` mapped to `.tar`,
    /// or `.out` appended when no known suffix is present.
    fn default_output_name(&self) -> PathBuf {
        let base = self
            .file
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or("out")
            .split(['?', '#'])
            .next()
            .unwrap_or("out");

        let lower = base.to_ascii_lowercase();
        let stem_len = |suffix: &str| base.len() - suffix.len();

        let name = if lower.ends_with(".tgz") {
            format!("{}.tar", &base[..stem_len(".tgz")])
        } else if let Some(suffix) = [".gz", "-gz", ".z"]
            .into_iter()
            .find(|s| lower.ends_with(s) && lower.len() > s.len())
        {
            base[..stem_len(suffix)].to_string()
        } else {
            format!("{}.out", base)
        };

        PathBuf::from(name)
    }
}
