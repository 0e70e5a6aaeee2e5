use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::{
    labeled_bids, Attachment, DeliveryInfo, DimensionUnit, Dimensions, FeedbackPacket, RfqSubmission,
};
use std::sync::Arc;
use tracing::info;
use workflow_client::{Credential, HttpBackend, WorkflowController};

#[derive(Parser)]
#[command(name = "itemctl")]
struct Args {
    #[arg(long, env = "SOURCING_API_URL", default_value = "http://localhost:3001")]
    api_url: String,

    #[arg(long, env = "SOURCING_API_TOKEN")]
    token: Option<String>,

    #[arg(long)]
    item: i64,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the current snapshot and derived values
    State,
    /// Print the step timeline
    Timeline,
    SubmitRfq {
        #[arg(long)]
        quantity: i64,
        #[arg(long, num_args = 3, value_names = ["W", "D", "H"])]
        dims: Vec<f64>,
        #[arg(long, default_value = "cm")]
        unit: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        postal_code: Option<String>,
        #[arg(long = "invite")]
        invited: Vec<i64>,
        #[arg(long)]
        auto_invite: bool,
    },
    Award {
        bid_id: i64,
    },
    RequestCad,
    RequestCadRevision {
        /// file_name=url pairs
        #[arg(long = "file", required = true)]
        files: Vec<String>,
    },
    ApproveCad,
    ReleaseCad,
    ApprovePrototype,
    /// Feedback packet as JSON keyed by keyword id
    RequestPrototypeChanges {
        #[arg(long)]
        packet: String,
    },
}

fn parse_attachment(raw: &str) -> Result<Attachment> {
    let (file_name, url) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("expected file_name=url, got '{}'", raw))?;
    Ok(Attachment {
        file_name: file_name.to_string(),
        url: url.to_string(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let backend = HttpBackend::new(args.api_url, args.token.map(Credential::new));
    let mut controller = WorkflowController::new(Arc::new(backend));
    controller.open(args.item).await?;

    match args.command {
        Cmd::State => {}
        Cmd::Timeline => {
            let timeline = controller.timeline().await?;
            println!("{}", serde_json::to_string_pretty(timeline)?);
            return Ok(());
        }
        Cmd::SubmitRfq {
            quantity,
            dims,
            unit,
            country,
            postal_code,
            invited,
            auto_invite,
        } => {
            let unit = DimensionUnit::parse(&unit)
                .ok_or_else(|| anyhow::anyhow!("unknown unit '{}'", unit))?;
            let dimensions = Dimensions {
                w: dims.first().copied(),
                d: dims.get(1).copied(),
                h: dims.get(2).copied(),
                unit,
            };
            controller
                .submit_rfq(RfqSubmission {
                    quantity: Some(quantity),
                    dimensions,
                    delivery: DeliveryInfo {
                        country,
                        postal_code,
                    },
                    invited_supplier_ids: invited,
                    auto_invite,
                })
                .await?;
        }
        Cmd::Award { bid_id } => controller.award_bid(bid_id).await?,
        Cmd::RequestCad => controller.request_cad_and_prototype().await?,
        Cmd::RequestCadRevision { files } => {
            let files = files
                .iter()
                .map(|raw| parse_attachment(raw))
                .collect::<Result<Vec<_>>>()?;
            controller.request_cad_revision(files).await?;
        }
        Cmd::ApproveCad => controller.approve_cad().await?,
        Cmd::ReleaseCad => controller.release_cad().await?,
        Cmd::ApprovePrototype => controller.approve_prototype().await?,
        Cmd::RequestPrototypeChanges { packet } => {
            let packet: FeedbackPacket = serde_json::from_str(&packet)?;
            controller.request_prototype_changes(packet).await?;
        }
    }

    let workflow = controller.workflow();
    let snapshot = workflow
        .current()
        .ok_or_else(|| anyhow::anyhow!("no snapshot loaded"))?;
    let metrics = snapshot.metrics();
    info!("Item {} loaded", snapshot.item_id());

    println!(
        "item {} state {} ({:?})",
        snapshot.item_id(),
        snapshot.macro_state().letter(),
        snapshot.editability()
    );
    println!(
        "sourcing {:?} timeline {:?} cbm {:?} total {:?}",
        metrics.sourcing_type, metrics.timeline_type, metrics.cbm, metrics.total_cbm
    );
    for labeled in labeled_bids(&snapshot.bids) {
        println!(
            "  {} bid {} total {} {:?}",
            labeled.label,
            labeled.bid.bid_id,
            labeled.bid.total_price,
            labeled.bid.award_standing()
        );
    }
    println!("cad {} prototype {}", snapshot.cad.status, snapshot.prototype.status);
    if let Some(payment) = &snapshot.payment {
        println!("payment {} {:?} due {}", payment.id, payment.status, payment.total_due);
    }
    Ok(())
}
