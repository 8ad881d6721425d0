use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Instrument};

use order_desk::app_system::{setup_tracing, OrderDesk};
use order_desk::config::Config;
use order_desk::domain::{LineItem, LineItemDraft, Order, OrderStatus};
use order_desk::error::ValidationError;
use order_desk::view::{ActiveModal, FormInput, OrderListClient, ViewSnapshot};

#[derive(Parser)]
#[command(name = "order-desk", version, about = "Manage orders from the command line")]
struct Args {
    /// TOML configuration file. Without one, ORDER_DESK_* variables are used.
    #[arg(short, long, env = "ORDER_DESK_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `order_desk=trace`. Overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and keep the session for later commands
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ORDER_DESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ORDER_DESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    #[command(flatten)]
    Orders(OrderCommand),
}

#[derive(Subcommand)]
enum OrderCommand {
    /// List all orders
    List,
    /// Show one order
    Show { id: String },
    /// Create an order
    Create {
        #[arg(long)]
        customer: String,
        #[arg(long)]
        email: String,
        /// NAME:QUANTITY:PRICE, repeatable
        #[arg(long = "item", required = true)]
        items: Vec<LineItemDraft>,
    },
    /// Edit an order's customer fields and items
    Edit {
        id: String,
        #[arg(long)]
        customer: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// NAME:QUANTITY:PRICE, repeatable
        #[arg(long = "add-item")]
        add_items: Vec<LineItemDraft>,
        /// Item id, repeatable
        #[arg(long = "remove-item")]
        remove_items: Vec<String>,
        /// ITEM_ID=NAME:QUANTITY:PRICE, repeatable
        #[arg(long = "set-item")]
        set_items: Vec<ItemReplacement>,
    },
    /// Change an order's status (PENDENTE, PROCESSANDO, ENVIADO, CANCELADO)
    Status { id: String, status: OrderStatus },
    /// Delete an order
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone)]
struct ItemReplacement {
    item_id: String,
    draft: LineItemDraft,
}

impl FromStr for ItemReplacement {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (item_id, draft) = s.split_once('=').ok_or(ValidationError::InvalidItem)?;
        Ok(Self {
            item_id: item_id.trim().to_string(),
            draft: draft.parse()?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();
    setup_tracing(args.log_level.as_deref());

    info!("Starting order desk");
    run(args).await
}

async fn run(args: Args) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => Config::from_file(path),
        None => Config::from_env(),
    }
    .map_err(|e| e.to_string())?;

    let mut desk = OrderDesk::start(&config).await.map_err(|e| e.to_string())?;

    let result = match args.command {
        Command::Login { email, password } => desk
            .auth
            .login(&email, &password)
            .await
            .map(|user| println!("Signed in as {}", user.email.unwrap_or(user.uid)))
            .map_err(|e| e.to_string()),
        Command::Register { email, password } => desk
            .auth
            .register(&email, &password)
            .await
            .map(|()| println!("Account created. Sign in with `order-desk login`."))
            .map_err(|e| e.to_string()),
        Command::Logout => {
            desk.auth.logout().await;
            println!("Signed out");
            Ok(())
        }
        Command::Orders(command) => match desk.open_orders().await {
            Ok(client) => {
                let span = tracing::info_span!("order_command");
                let result = drive(&client, command).instrument(span).await;
                drop(client);
                result
            }
            Err(e) => Err(format!("{e}. Sign in with `order-desk login` first.")),
        },
    };

    desk.shutdown().await?;
    result
}

/// Runs one command against the list view the way a user would click through it.
async fn drive(client: &OrderListClient, command: OrderCommand) -> Result<(), String> {
    let mounted = settle(client).await?;

    match command {
        OrderCommand::List => {
            print_notifications(&mounted);
            print_orders(&mounted.orders);
        }
        OrderCommand::Show { id } => {
            client.open_detail(id).await.map_err(|e| e.to_string())?;
            let snapshot = settle(client).await?;
            match &snapshot.modal {
                ActiveModal::Detail(view) => println!("{view}"),
                _ => {
                    print_notifications(&snapshot);
                    return Err("Could not load the order".into());
                }
            }
        }
        OrderCommand::Create {
            customer,
            email,
            items,
        } => {
            client.open_create().await.map_err(|e| e.to_string())?;
            require_modal(&settle(client).await?, "create")?;
            input(client, FormInput::CustomerName(customer)).await?;
            input(client, FormInput::Email(email)).await?;
            for item in items {
                input(client, FormInput::Draft(item)).await?;
                input(client, FormInput::AddItem).await?;
            }
            submit_and_report(client).await?;
        }
        OrderCommand::Edit {
            id,
            customer,
            email,
            add_items,
            remove_items,
            set_items,
        } => {
            client.open_edit(id).await.map_err(|e| e.to_string())?;
            let snapshot = settle(client).await?;
            let ActiveModal::Edit(form) = &snapshot.modal else {
                print_notifications(&snapshot);
                return Err("Could not load the order".into());
            };
            check_item_ids(form.items(), &remove_items, &set_items)?;
            if let Some(customer) = customer {
                input(client, FormInput::CustomerName(customer)).await?;
            }
            if let Some(email) = email {
                input(client, FormInput::Email(email)).await?;
            }
            for item_id in remove_items {
                input(client, FormInput::RemoveItem(item_id)).await?;
            }
            for replacement in set_items {
                input(client, FormInput::BeginItemEdit(replacement.item_id)).await?;
                input(client, FormInput::ItemEditDraft(replacement.draft)).await?;
                input(client, FormInput::ApplyItemEdit).await?;
            }
            for item in add_items {
                input(client, FormInput::Draft(item)).await?;
                input(client, FormInput::AddItem).await?;
            }
            submit_and_report(client).await?;
        }
        OrderCommand::Status { id, status } => {
            client.open_status(id).await.map_err(|e| e.to_string())?;
            let snapshot = settle(client).await?;
            require_modal(&snapshot, "status")?;
            if let ActiveModal::Status(dialog) = &snapshot.modal {
                info!(
                    order_id = dialog.order_id(),
                    from = %dialog.current(),
                    to = %status,
                    "Changing status"
                );
            }
            client
                .select_status(Some(status))
                .await
                .map_err(|e| e.to_string())?;
            submit_and_report(client).await?;
        }
        OrderCommand::Delete { id, yes } => {
            client.open_delete(id).await.map_err(|e| e.to_string())?;
            let snapshot = settle(client).await?;
            let ActiveModal::DeleteConfirm(dialog) = &snapshot.modal else {
                print_notifications(&snapshot);
                return Err("Could not open the order".into());
            };
            let confirmed = yes || ask(&dialog.prompt()).await?;
            client
                .confirm_delete(confirmed)
                .await
                .map_err(|e| e.to_string())?;
            let snapshot = settle(client).await?;
            print_notifications(&snapshot);
            print_orders(&snapshot.orders);
        }
    }
    Ok(())
}

async fn settle(client: &OrderListClient) -> Result<ViewSnapshot, String> {
    client.settle().await.map_err(|e| e.to_string())
}

async fn input(client: &OrderListClient, input: FormInput) -> Result<(), String> {
    client.input(input).await.map_err(|e| e.to_string())
}

/// Fails unless `expected` is the modal now open.
fn require_modal(snapshot: &ViewSnapshot, expected: &str) -> Result<(), String> {
    if snapshot.modal.name() == expected {
        return Ok(());
    }
    print_notifications(snapshot);
    Err(format!("Could not open the {expected} dialog"))
}

/// Every item named on the command line must exist on the loaded order.
fn check_item_ids(
    items: &[LineItem],
    remove: &[String],
    replace: &[ItemReplacement],
) -> Result<(), String> {
    let known = |id: &str| items.iter().any(|item| item.id == id);
    let unknown = remove
        .iter()
        .map(String::as_str)
        .chain(replace.iter().map(|r| r.item_id.as_str()))
        .find(|id| !known(id));
    match unknown {
        Some(id) => Err(ValidationError::UnknownItem(id.to_string()).to_string()),
        None => Ok(()),
    }
}

/// Submits the open modal and reports whether it closed.
async fn submit_and_report(client: &OrderListClient) -> Result<(), String> {
    client.submit().await.map_err(|e| e.to_string())?;
    let snapshot = settle(client).await?;
    print_notifications(&snapshot);
    if snapshot.modal.is_open() {
        return Err("Changes were not saved".into());
    }
    print_orders(&snapshot.orders);
    Ok(())
}

async fn ask(prompt: &str) -> Result<bool, String> {
    println!("{prompt} [y/N]");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .map_err(|e| e.to_string())?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_notifications(snapshot: &ViewSnapshot) {
    for notification in &snapshot.notifications {
        println!("{notification}");
    }
}

fn print_orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders.");
        return;
    }
    for order in orders {
        println!("{:<24} {}", order.id, order.summary_line());
    }
}
