use clap::{Args, Parser, Subcommand};
use dc_app::{AppError, AppResult, ClientConfig, HttpBackend, ModelService, shared_store};
use dc_core::EntityId;
use dc_frames::{Frame288, LoadData, LoadType};
use dc_query::{
    EncodeOptions, FilterClause, FilterRequest, ListOptions, Pagination, with_query,
};
use dc_store::{Entity, EntityKind, Store};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dc-cli")]
#[command(about = "dercache CLI - cached access to DER dashboard models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the encoded request for a route
    Encode {
        /// Route, e.g. /load/meter_group/
        route: String,
        #[command(flatten)]
        request: RequestArgs,
        /// Use comma-joined arrays and camelCase page size
        #[arg(long)]
        legacy: bool,
    },
    /// Fetch models into the cache and list what is cached
    Fetch {
        /// Entity kind (meter_group, scenario, der_strategy, ...)
        kind: String,
        /// Model id; omit to fetch a list
        id: Option<String>,
        #[command(flatten)]
        request: RequestArgs,
        #[command(flatten)]
        client: ClientArgs,
        /// Follow `next` until every page is fetched
        #[arg(long)]
        all: bool,
    },
    /// Delete a model on the backend
    Delete {
        /// Entity kind
        kind: String,
        /// Model id
        id: String,
        #[command(flatten)]
        client: ClientArgs,
    },
    /// Auto-scale a load payload read from a JSON file
    Scale {
        /// Path to a Frame288 or interval series JSON file
        path: PathBuf,
        /// Aggregate an interval series into a 288 frame first
        #[arg(long, value_name = "LOAD_TYPE")]
        aggregate: Option<String>,
    },
}

#[derive(Args)]
struct ClientArgs {
    /// Client configuration YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Backend base URL
    #[arg(long, env = "DERCACHE_BASE_URL")]
    base_url: Option<String>,
    /// Session token
    #[arg(long, env = "DERCACHE_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Args)]
struct RequestArgs {
    /// Comma-separated load types, e.g. default,average
    #[arg(long, value_name = "TAGS")]
    data_types: Option<String>,
    /// Interval period in minutes
    #[arg(long)]
    period: Option<u32>,
    /// Filter clause: field=value, field.in=a,b, field.gte=value
    #[arg(long = "filter", value_name = "CLAUSE")]
    filters: Vec<String>,
    #[arg(long)]
    include: Vec<String>,
    #[arg(long)]
    exclude: Vec<String>,
    #[arg(long)]
    sort: Vec<String>,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    page_size: Option<u32>,
}

impl RequestArgs {
    fn filter(&self) -> AppResult<FilterRequest> {
        let mut filter = FilterRequest::new();
        if let Some(tags) = &self.data_types {
            filter = filter.data_types(FilterRequest::parse_data_types(tags)?);
        }
        if let Some(period) = self.period {
            filter = filter.period(period);
        }
        for text in &self.filters {
            filter = filter.clause(FilterClause::parse(text)?);
        }
        Ok(filter)
    }

    fn page_size(&self, default_page_size: u32) -> u32 {
        self.page_size.unwrap_or(default_page_size)
    }

    /// `--page-size` alone requests the first page.
    fn options(&self, default_page_size: u32) -> ListOptions {
        let pagination = match (self.page, self.page_size) {
            (None, None) => None,
            (page, _) => Some(Pagination::new(
                page.unwrap_or(1),
                self.page_size(default_page_size),
            )),
        };
        ListOptions {
            pagination,
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            sort: self.sort.clone(),
        }
    }
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            route,
            request,
            legacy,
        } => cmd_encode(&route, &request, legacy),
        Commands::Fetch {
            kind,
            id,
            request,
            client,
            all,
        } => cmd_fetch(&kind, id.as_deref(), &request, &client, all),
        Commands::Delete { kind, id, client } => cmd_delete(&kind, &id, &client),
        Commands::Scale { path, aggregate } => cmd_scale(&path, aggregate.as_deref()),
    }
}

fn client_config(args: &ClientArgs) -> AppResult<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(token) = &args.token {
        config.token = Some(token.clone());
    }
    config.validate()?;
    Ok(config)
}

fn runtime() -> AppResult<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

fn cmd_encode(route: &str, request: &RequestArgs, legacy: bool) -> AppResult<()> {
    let options = if legacy {
        EncodeOptions::legacy()
    } else {
        EncodeOptions::default()
    };
    let query = request
        .options(ClientConfig::default().default_page_size)
        .build(&request.filter()?);
    println!("{}", with_query(route, Some(&query), options));
    Ok(())
}

fn cmd_fetch(
    kind: &str,
    id: Option<&str>,
    request: &RequestArgs,
    client: &ClientArgs,
    all: bool,
) -> AppResult<()> {
    let kind: EntityKind = kind.parse()?;
    let config = client_config(client)?;
    let page_size = request.page_size(config.default_page_size);
    let filter = request.filter()?;
    let options = request.options(page_size);

    let service = ModelService::new(HttpBackend::new(config)?, shared_store(Store::new()));
    let site = service.site(format!("cli {kind}"));

    runtime()?.block_on(async {
        match id {
            Some(id) => {
                let id = EntityId::parse(id)?;
                service
                    .load_entity(&site, kind, &id, &filter, &options)
                    .await
                    .into_result()?;
            }
            None if all => {
                service
                    .fetch_all_pages(kind, &filter, &options, page_size)
                    .await?;
            }
            None => {
                service
                    .load_list(&site, kind, &filter, &options)
                    .await
                    .into_result()?;
            }
        }
        Ok::<_, AppError>(())
    })?;

    let store = service.store().borrow();
    let entities = store.select_all(kind);
    if entities.is_empty() {
        println!("No {} models cached", kind);
    } else {
        println!("Cached {} models:", kind);
        for entity in entities {
            print_entity(entity);
        }
    }
    Ok(())
}

fn print_entity(entity: &Entity) {
    let tags: Vec<&str> = entity.data.iter().map(|(tag, _)| tag.as_str()).collect();
    println!(
        "  {} - {} [{}]",
        entity.id,
        entity.name().unwrap_or("(unnamed)"),
        tags.join(", ")
    );
}

fn cmd_delete(kind: &str, id: &str, client: &ClientArgs) -> AppResult<()> {
    let kind: EntityKind = kind.parse()?;
    let id = EntityId::parse(id)?;
    let config = client_config(client)?;
    let service = ModelService::new(HttpBackend::new(config)?, shared_store(Store::new()));

    runtime()?.block_on(service.delete(kind, &id))?;
    println!("✓ Deleted {} {}", kind, id);
    Ok(())
}

fn cmd_scale(path: &Path, aggregate: Option<&str>) -> AppResult<()> {
    let content = std::fs::read_to_string(path)?;
    let data: LoadData = serde_json::from_str(&content)?;

    let frame = match (data, aggregate) {
        (LoadData::Frame(frame), None) => frame,
        (LoadData::Frame(_), Some(_)) => {
            return Err(AppError::InvalidInput(
                "--aggregate applies to interval series only".to_string(),
            ));
        }
        (LoadData::Interval(series), Some(load_type)) => {
            let load_type: LoadType = load_type.parse().map_err(AppError::InvalidInput)?;
            series.to_frame288(load_type)
        }
        (LoadData::Interval(series), None) => {
            let (scaled, unit) = series.scale_with_unit();
            let (lo, hi) = scaled.range();
            println!(
                "Interval series: {} samples, period {} min",
                scaled.len(),
                scaled
                    .period()
                    .map_or_else(|| "n/a".to_string(), |p| p.to_string())
            );
            println!("  Range: {:.3} to {:.3} {}", lo, hi, unit);
            return Ok(());
        }
    };

    print_frame(&frame);
    Ok(())
}

fn print_frame(frame: &Frame288) {
    let (scaled, unit) = frame.scale_with_unit();
    let (lo, hi) = scaled.range();
    println!("Frame288{}:", frame.name().map(|n| format!(" '{}'", n)).unwrap_or_default());
    println!("  Range: {:.3} to {:.3} {}", lo, hi, unit);
    for (month, row) in scaled.months().iter().enumerate() {
        let peak = row.iter().copied().fold(f64::NAN, f64::max);
        println!("  {:>2}: peak {:.3} {}", month + 1, peak, unit);
    }
}
