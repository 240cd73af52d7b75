use std::env;
use std::process;

use chrono::Utc;
use clap::{Arg, ArgMatches, Command};
use url::Url;

use mesa_pos::cart::OrderCart;
use mesa_pos::catalog::{self, CategoryFilter};
use mesa_pos::config::{PosConfig, PosOptions};
use mesa_pos::error::{Error, Result};
use mesa_pos::floor::{self, FloorView};
use mesa_pos::history::{self, HistoryFilter, SortState};
use mesa_pos::logging;
use mesa_pos::money::format_amount;
use mesa_pos::poller::{Refresher, Ticker};
use mesa_pos::routes::Route;
use mesa_pos::Pos;

fn cli() -> Command<'static> {
    Command::new("pos")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Restaurant point-of-sale from the terminal")
        .arg(
            Arg::new("url")
                .long("url")
                .value_name("URL")
                .global(true)
                .takes_value(true)
                .help("Project URL (default: SUPABASE_URL)"),
        )
        .arg(
            Arg::new("key")
                .long("key")
                .value_name("KEY")
                .global(true)
                .takes_value(true)
                .help("Anon key (default: SUPABASE_ANON_KEY)"),
        )
        .arg(
            Arg::new("email")
                .long("email")
                .global(true)
                .takes_value(true)
                .help("Sign in before running the command (default: POS_EMAIL)"),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .global(true)
                .takes_value(true)
                .help("Password for --email (default: POS_PASSWORD)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .takes_value(true)
                .help("Log filter, e.g. debug (default: RUST_LOG, then info)"),
        )
        .subcommand_required(true)
        .subcommand(Command::new("login").about("Sign in and show the staff profile"))
        .subcommand(
            Command::new("show")
                .about("Render the screen behind a path, e.g. /tables or /menus?category=2")
                .arg(Arg::new("path").required(true)),
        )
        .subcommand(
            Command::new("order")
                .about("Compose and save an order")
                .arg(Arg::new("table").long("table").takes_value(true))
                .arg(
                    Arg::new("order")
                        .long("order")
                        .takes_value(true)
                        .help("Edit this order instead of creating one"),
                )
                .arg(
                    Arg::new("add")
                        .long("add")
                        .takes_value(true)
                        .multiple_occurrences(true)
                        .value_name("PRODUCT[xQTY]"),
                )
                .arg(
                    Arg::new("note")
                        .long("note")
                        .takes_value(true)
                        .multiple_occurrences(true)
                        .value_name("PRODUCT=TEXT"),
                )
                .arg(Arg::new("discount").long("discount").takes_value(true)),
        )
        .subcommand(
            Command::new("toggle-table")
                .about("Flip a table between free and occupied")
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(
            Command::new("close-order")
                .about("Close an order and free its table")
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(
            Command::new("floor")
                .about("Tables with their current orders")
                .arg(Arg::new("watch").long("watch").help("Keep refreshing until Ctrl-C")),
        )
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let matches = cli().get_matches();
    logging::init_logger(matches.value_of("log-level"));

    if let Err(e) = run(&matches).await {
        tracing::error!("{}", e);
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

async fn run(matches: &ArgMatches) -> Result<()> {
    let pos = connect(matches)?;
    sign_in(&pos, matches).await?;

    match matches.subcommand() {
        Some(("login", _)) => login(&pos).await,
        Some(("show", args)) => show(&pos, value(args, "path")?).await,
        Some(("order", args)) => order(&pos, args).await,
        Some(("toggle-table", args)) => toggle_table(&pos, parse_id(args, "id")?).await,
        Some(("close-order", args)) => close_order(&pos, parse_id(args, "id")?).await,
        Some(("floor", args)) => {
            if args.is_present("watch") {
                watch_floor(&pos).await
            } else {
                print_floor(&pos.floor().load().await?);
                Ok(())
            }
        }
        _ => Err(Error::general("unknown command")),
    }
}

fn connect(matches: &ArgMatches) -> Result<Pos> {
    let config = match (matches.value_of("url"), matches.value_of("key")) {
        (Some(url), Some(key)) => PosConfig::new(url, key)?,
        _ => PosConfig::from_env()?,
    };
    Pos::from_config(config, PosOptions::from_env()?)
}

async fn sign_in(pos: &Pos, matches: &ArgMatches) -> Result<()> {
    let email = matches
        .value_of("email")
        .map(str::to_string)
        .or_else(|| env::var("POS_EMAIL").ok());
    let password = matches
        .value_of("password")
        .map(str::to_string)
        .or_else(|| env::var("POS_PASSWORD").ok());

    match (email, password) {
        (Some(email), Some(password)) => {
            pos.auth().sign_in_with_password(&email, &password).await?;
            Ok(())
        }
        (Some(_), None) => Err(Error::config("--email needs --password")),
        _ => Ok(()),
    }
}

fn value<'m>(args: &'m ArgMatches, name: &str) -> Result<&'m str> {
    args.value_of(name)
        .ok_or_else(|| Error::general(format!("missing <{}>", name)))
}

fn parse_id(args: &ArgMatches, name: &str) -> Result<i64> {
    let raw = value(args, name)?;
    raw.parse()
        .map_err(|_| Error::general(format!("{} is not a valid id: {}", name, raw)))
}

async fn login(pos: &Pos) -> Result<()> {
    if pos.auth().get_session().is_none() {
        return Err(Error::config("pass --email and --password (or POS_EMAIL / POS_PASSWORD)"));
    }
    match pos.users().current().await? {
        Some(profile) => {
            println!("Signed in as {}", profile.display_name());
            if let Some(role) = profile.role {
                println!("Role: {}", role);
            }
        }
        None => println!("Signed in; no staff profile found"),
    }
    Ok(())
}

async fn show(pos: &Pos, path: &str) -> Result<()> {
    let requested =
        Route::parse(path).ok_or_else(|| Error::not_found(format!("route {}", path)))?;
    let route = requested.resolve(pos.auth().get_session().is_some());
    if route != requested {
        println!("→ {}", route);
    }

    match route {
        Route::Login => println!("Sign in with `pos login --email … --password …`"),
        Route::Home | Route::Dashboard => print_summary(&pos.floor().load().await?),
        Route::Tables => {
            for table in pos.tables().list().await? {
                println!(
                    "{:>4}  {:<16} {:<6} {:>2} pax  {}",
                    table.id, table.name, table.code, table.capacity, table.status
                );
            }
        }
        Route::MenuCategories => {
            for category in pos.categories().list().await? {
                println!(
                    "{:>4}  {} {:<20} {}",
                    category.id,
                    category.icon.as_deref().unwrap_or(catalog::DEFAULT_CATEGORY_ICON),
                    category.name,
                    category.status.as_str()
                );
            }
        }
        Route::Menus => {
            let filter = CategoryFilter::parse(query_param(path, "category").as_deref());
            let products = pos.products().list().await?;
            for product in catalog::filter_products(&products, filter) {
                println!(
                    "{:>4}  {:<28} {:>10}  {:<12} {}",
                    product.id,
                    product.name,
                    format_amount(product.price()),
                    product.category_name().unwrap_or("-"),
                    product.status.as_str()
                );
            }
        }
        Route::Warehouse => {
            for product in pos.products().list().await? {
                if let Some(stock) = product.stock {
                    let flag = if product.is_low_stock() { "  LOW" } else { "" };
                    println!("{:>4}  {:<28} {:>5}{}", product.id, product.name, stock, flag);
                }
            }
        }
        Route::Orders => {
            let orders = pos
                .history()
                .fetch(&HistoryFilter::default(), SortState::default())
                .await?;
            for order in orders {
                println!(
                    "{:>6}  {:<12} {:<18} {:>10}  {}",
                    order.id,
                    history::table_label(&order),
                    order.status.as_str(),
                    format_amount(order.items_total()),
                    order
                        .created_at
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default()
                );
            }
        }
        Route::CreateOrder { table_id } => {
            println!("New order for table {}", table_id);
            let categories = pos.categories().list_active().await?;
            for entry in catalog::sidebar(&categories, CategoryFilter::All) {
                println!("  {} {}", entry.icon, entry.label);
            }
            for product in pos.products().list_menu().await? {
                println!("{:>4}  {:<28} {:>10}", product.id, product.name, format_amount(product.price()));
            }
        }
        Route::EditOrder { order_id } => {
            let cart = pos.orders().load_cart(order_id).await?;
            print_cart(&cart);
        }
        Route::Printer => println!("Printing is not available from the terminal"),
    }
    Ok(())
}

fn query_param(path: &str, name: &str) -> Option<String> {
    let base = Url::parse("http://pos.local").ok()?;
    let url = base.join(path).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

async fn order(pos: &Pos, args: &ArgMatches) -> Result<()> {
    let orders = pos.orders();
    let mut cart = match args.value_of("order") {
        Some(_) => orders.load_cart(parse_id(args, "order")?).await?,
        None => orders.new_cart(None),
    };
    if args.is_present("table") {
        cart.set_table(Some(parse_id(args, "table")?));
    }

    let menu = pos.products().list_menu().await?;
    for entry in args.values_of("add").into_iter().flatten() {
        let (product_id, quantity) = parse_line(entry)?;
        let product = menu
            .iter()
            .find(|p| p.id == product_id)
            .ok_or_else(|| Error::not_found(format!("product {} on the menu", product_id)))?;
        let id = cart.add_product(product).id.clone();
        cart.update_item_quantity(&id, quantity);
    }

    for note in args.values_of("note").into_iter().flatten() {
        let (product, text) = note
            .split_once('=')
            .ok_or_else(|| Error::general(format!("expected PRODUCT=TEXT, got {}", note)))?;
        let product_id: i64 = product
            .trim()
            .parse()
            .map_err(|_| Error::general(format!("not a product id: {}", product)))?;
        let line = cart
            .items()
            .iter()
            .rev()
            .find(|item| item.product.id == product_id)
            .map(|item| item.id.clone())
            .ok_or_else(|| Error::not_found(format!("product {} in the order", product_id)))?;
        if let Some(mut editor) = cart.open_edit_modal(&line) {
            editor.set_notes(text);
            cart.save_item_options(editor);
        }
    }

    if let Some(discount) = args.value_of("discount") {
        cart.set_discount(discount);
    }

    print_cart(&cart);
    let order_id = orders.save_cart(&cart).await?;
    println!("Saved order {}", order_id);
    Ok(())
}

/// `12` or `12x3`
fn parse_line(entry: &str) -> Result<(i64, i32)> {
    let (id, quantity) = match entry.split_once(['x', 'X']) {
        Some((id, quantity)) => (id, quantity),
        None => (entry, "1"),
    };
    let id = id
        .trim()
        .parse()
        .map_err(|_| Error::general(format!("not a product id: {}", entry)))?;
    let quantity = quantity
        .trim()
        .parse()
        .map_err(|_| Error::general(format!("not a quantity: {}", entry)))?;
    Ok((id, quantity))
}

async fn toggle_table(pos: &Pos, id: i64) -> Result<()> {
    let tables = pos.tables();
    let table = tables
        .list()
        .await?
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| Error::not_found(format!("table {}", id)))?;
    let updated = tables.toggle_status(&table).await?;
    if let Some(table) = updated.iter().find(|t| t.id == id) {
        println!("{} is now {}", table.name, table.status);
    }
    Ok(())
}

async fn close_order(pos: &Pos, id: i64) -> Result<()> {
    let orders = pos.orders();
    let order = orders.get(id).await?;
    orders.close_order(&order).await?;
    println!(
        "Closed order {} ({}), {}",
        id,
        history::table_label(&order),
        format_amount(order.items_total())
    );
    Ok(())
}

async fn watch_floor(pos: &Pos) -> Result<()> {
    let options = pos.options().clone();
    let ticker = Ticker::spawn(options.clock_interval);
    let source = pos.clone();
    let refresher = Refresher::spawn(options.refresh_interval, move || {
        let pos = source.clone();
        async move { pos.floor().load().await }
    });

    let mut updates = refresher.subscribe();
    let mut clock = ticker.subscribe();
    let mut latest: Option<FloorView> = None;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                latest = updates.borrow().clone();
            }
            changed = clock.changed() => {
                if changed.is_err() {
                    break;
                }
                // Repaint elapsed times only once a minute
                if ticker.now().timestamp() % 60 != 0 {
                    continue;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
        if let Some(view) = &latest {
            print!("\x1b[2J\x1b[H");
            print_floor(view);
        }
    }
    Ok(())
}

fn print_floor(view: &FloorView) {
    let now = Utc::now();
    for card in &view.cards {
        match &card.order {
            Some(order) => println!(
                "{:<16} {:<10} #{:<6} {:>8}  {:>10}  {}",
                card.table.name,
                card.table.status.as_str(),
                order.id,
                floor::format_elapsed(card.elapsed(now)),
                format_amount(card.order_total()),
                order
                    .user
                    .as_ref()
                    .map(|u| u.display_name())
                    .unwrap_or_default()
            ),
            None => println!("{:<16} {}", card.table.name, card.table.status.as_str()),
        }
    }
    print_summary(view);
}

fn print_summary(view: &FloorView) {
    let summary = view.summary();
    println!(
        "free {} · occupied {} · reserved {} · open orders {} · {}",
        summary.free,
        summary.occupied,
        summary.reserved,
        summary.open_orders,
        format_amount(summary.open_amount)
    );
}

fn print_cart(cart: &OrderCart) {
    for item in cart.items() {
        println!(
            "{:>3} × {:<28} {:>10}",
            item.quantity,
            item.product.name,
            format_amount(item.line_total())
        );
        for option in &item.options {
            println!("        + {}", option.name);
        }
        if !item.notes.is_empty() {
            println!("        \"{}\"", item.notes);
        }
    }
    let totals = cart.totals();
    println!("Subtotal {:>10}", format_amount(totals.subtotal));
    println!("IGV      {:>10}", format_amount(totals.tax));
    if !totals.discount.is_zero() {
        println!("Discount {:>10}", format_amount(totals.discount));
    }
    println!("Total    {:>10}", format_amount(totals.total));
}
