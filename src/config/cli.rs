use crate::core::export::OutputFormat;
use crate::domain::model::{FpdsQueryFilters, FpdsSort, FpdsSortField, SearchFilters};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "procure-search")]
#[command(about = "Search federal and municipal procurement sources from one place")]
#[command(version)]
pub struct CliConfig {
    #[arg(long, short, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, short, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 啟動 HTTP API
    Serve(ServeArgs),
    /// 執行一次聚合搜尋並輸出結果
    Search(SearchArgs),
    /// 只印出 FPDS 查詢字串，不發出請求
    FpdsQuery(FpdsQueryArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    #[arg(long, help = "Socket address to bind, overrides [server].bind")]
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    #[arg(long)]
    pub keyword: Option<String>,

    #[arg(long)]
    pub naics: Option<String>,

    #[arg(long)]
    pub agency: Option<String>,

    #[arg(long, help = "Posted on or after (YYYY-MM-DD)")]
    pub from: Option<String>,

    #[arg(long, help = "Posted on or before (YYYY-MM-DD)")]
    pub to: Option<String>,

    #[arg(long, value_delimiter = ',', help = "sam_gov,fpds,municipal (default: all)")]
    pub platforms: Vec<String>,

    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    #[arg(long, short, help = "Write results to a file instead of stdout")]
    pub output: Option<String>,
}

impl SearchArgs {
    pub fn filters(&self) -> SearchFilters {
        SearchFilters {
            keyword: self.keyword.clone(),
            naics_code: self.naics.clone(),
            agency: self.agency.clone(),
            posted_from: self.from.clone(),
            posted_to: self.to.clone(),
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct FpdsQueryArgs {
    #[arg(long)]
    pub keyword: Option<String>,

    #[arg(long)]
    pub vendor: Option<String>,

    #[arg(long)]
    pub piid: Option<String>,

    #[arg(long)]
    pub agency: Option<String>,

    #[arg(long)]
    pub naics: Option<String>,

    #[arg(long)]
    pub psc: Option<String>,

    #[arg(long)]
    pub signed_from: Option<String>,

    #[arg(long)]
    pub signed_to: Option<String>,

    #[arg(long)]
    pub min_amount: Option<String>,

    #[arg(long)]
    pub max_amount: Option<String>,
}

impl FpdsQueryArgs {
    pub fn filters(&self) -> FpdsQueryFilters {
        FpdsQueryFilters {
            keyword: self.keyword.clone(),
            vendor_name: self.vendor.clone(),
            piid: self.piid.clone(),
            agency: self.agency.clone(),
            naics: self.naics.clone(),
            psc: self.psc.clone(),
            signed_date_from: self.signed_from.clone(),
            signed_date_to: self.signed_to.clone(),
            obligation_min: self.min_amount.clone(),
            obligation_max: self.max_amount.clone(),
            sort: Some(FpdsSort {
                field: FpdsSortField::SignedDate,
                descending: true,
            }),
            ..Default::default()
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(config) = &self.config {
            validation::validate_path("config", config)?;
            validation::validate_file_extensions("config", std::slice::from_ref(config), &["toml"])?;
        }

        match &self.command {
            Some(Command::Serve(args)) => {
                if let Some(bind) = &args.bind {
                    validation::validate_socket_addr("bind", bind)?;
                }
            }
            Some(Command::Search(args)) => {
                if let Some(limit) = args.limit {
                    validation::validate_range("limit", limit, 1, 1000)?;
                }
                if let Some(output) = &args.output {
                    validation::validate_path("output", output)?;
                }
            }
            Some(Command::FpdsQuery(_)) | None => {}
        }

        Ok(())
    }
}
