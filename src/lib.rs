//! Restaurant point-of-sale client
//!
//! Tables, menu categories, products and their add-ons, and orders, kept in a
//! hosted Postgres behind PostgREST. Each screen of the point-of-sale has an
//! entry point here:
//!
//! * [`store::TableStore`], [`store::CategoryStore`], [`store::ProductStore`]
//!   and [`store::ProductOptionStore`] for the management pages
//! * [`cart::OrderCart`] and [`store::OrderStore`] for composing orders
//! * [`floor::Floor`] for the live table view
//! * [`history::History`] for past orders
//!
//! # Example
//!
//! ```no_run
//! use mesa_pos::Pos;
//!
//! # async fn run() -> mesa_pos::error::Result<()> {
//! let pos = Pos::new("https://your-project.supabase.co", "your-anon-key")?;
//! pos.auth().sign_in_with_password("caja@example.com", "secret").await?;
//!
//! let menu = pos.products().list_menu().await?;
//! let mut cart = pos.orders().new_cart(Some(3));
//! cart.add_product(&menu[0]);
//! let order_id = pos.orders().save_cart(&cart).await?;
//! # let _ = order_id;
//! # Ok(())
//! # }
//! ```

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod floor;
pub mod history;
pub mod logging;
pub mod models;
pub mod money;
pub mod poller;
pub mod routes;
pub mod store;
pub mod validation;

use reqwest::Client;
use serde_json::Value;

use mesa_auth::{Auth, AuthOptions};
use mesa_postgrest::PostgrestClient;

use crate::config::{PosConfig, PosOptions};
use crate::error::Result;
use crate::floor::Floor;
use crate::history::History;
use crate::store::{
    CategoryStore, OrderStore, ProductOptionStore, ProductStore, TableStore, UserStore,
};

/// The main entry point
#[derive(Debug, Clone)]
pub struct Pos {
    config: PosConfig,
    options: PosOptions,
    http_client: Client,
    auth: Auth,
}

impl Pos {
    /// Create a client with default options
    ///
    /// # Arguments
    ///
    /// * `url` - The project base URL
    /// * `anon_key` - The anonymous API key
    pub fn new(url: &str, anon_key: &str) -> Result<Self> {
        Self::new_with_options(url, anon_key, PosOptions::default())
    }

    /// Create a client with custom options
    pub fn new_with_options(url: &str, anon_key: &str, options: PosOptions) -> Result<Self> {
        Self::from_config(PosConfig::new(url, anon_key)?, options)
    }

    /// Create a client from `SUPABASE_URL`, `SUPABASE_ANON_KEY` and `POS_TAX_RATE`
    pub fn from_env() -> Result<Self> {
        Self::from_config(PosConfig::from_env()?, PosOptions::from_env()?)
    }

    pub fn from_config(config: PosConfig, options: PosOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let auth = Auth::new(
            config.base_url(),
            &config.anon_key,
            http_client.clone(),
            AuthOptions {
                persist_session: options.persist_session,
            },
        );

        tracing::debug!(url = config.base_url(), "point-of-sale client created");

        Ok(Self {
            config,
            options,
            http_client,
            auth,
        })
    }

    /// The auth client for sign-in and session management
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    pub fn config(&self) -> &PosConfig {
        &self.config
    }

    pub fn options(&self) -> &PosOptions {
        &self.options
    }

    /// Query builder for a table. Requests carry the session token when
    /// signed in and the anon key otherwise.
    pub fn from(&self, table: &str) -> Result<PostgrestClient> {
        let client = PostgrestClient::new(
            self.config.base_url(),
            &self.config.anon_key,
            table,
            self.http_client.clone(),
        );
        Ok(client.with_auth(&self.bearer_token())?)
    }

    /// Call a stored function
    pub fn rpc(&self, function: &str, params: Value) -> Result<PostgrestClient> {
        let client = PostgrestClient::rpc(
            self.config.base_url(),
            &self.config.anon_key,
            function,
            params,
            self.http_client.clone(),
        );
        Ok(client.with_auth(&self.bearer_token())?)
    }

    /// Id of the signed-in user
    pub fn current_user_id(&self) -> Option<String> {
        self.auth.get_session().map(|session| session.user.id)
    }

    fn bearer_token(&self) -> String {
        self.auth
            .access_token()
            .unwrap_or_else(|| self.config.anon_key.clone())
    }

    pub fn tables(&self) -> TableStore<'_> {
        TableStore::new(self)
    }

    pub fn categories(&self) -> CategoryStore<'_> {
        CategoryStore::new(self)
    }

    pub fn products(&self) -> ProductStore<'_> {
        ProductStore::new(self)
    }

    pub fn product_options(&self) -> ProductOptionStore<'_> {
        ProductOptionStore::new(self)
    }

    pub fn orders(&self) -> OrderStore<'_> {
        OrderStore::new(self)
    }

    pub fn users(&self) -> UserStore<'_> {
        UserStore::new(self)
    }

    /// The live table view
    pub fn floor(&self) -> Floor<'_> {
        Floor::new(self)
    }

    /// Past orders
    pub fn history(&self) -> History<'_> {
        History::new(self)
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::cart::{CartTotals, ItemEditor, OrderCart};
    pub use crate::catalog::CategoryFilter;
    pub use crate::config::{PosConfig, PosOptions};
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
    pub use crate::routes::Route;
    pub use crate::Pos;
}
