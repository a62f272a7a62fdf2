//! Ticket Store demo
//!
//! Builds a store from the environment and walks one ticket through its
//! whole lifecycle, printing every request and response.
//!
//! # Usage
//!
//! ```bash
//! # In-memory
//! cargo run --bin ticket-store
//!
//! # Persist to a snapshot file and relax seller checks
//! TICKET_STORE_BACKEND=file TICKET_STORE_PATH=/tmp/tickets.db \
//! TICKET_STORE_REQUIRE_SELLER_AUTH=false cargo run --bin ticket-store
//! ```

use std::sync::Arc;
use ticket_store::{CallContext, Config, Principal, Ticket, TicketPayload, TicketService, TicketStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.logging.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        backend = %config.storage.backend,
        path = %config.storage.path.display(),
        require_seller_auth = config.auth.require_seller_auth,
        "Configuration loaded"
    );

    ticket_store::metrics::register_metrics();

    let store = Arc::new(TicketStore::from_config(&config)?);
    let service = TicketService::new(store);

    let seller = CallContext::new(Principal::new("seller-a"));
    let stranger = CallContext::new(Principal::new("seller-b"));

    println!("\n=== Ticket Store Demo ===\n");

    let ticket = service.add_ticket(&seller, TicketPayload::new("Dune", 12))?;
    show("addTicket {movie: Dune, placement: 12}", &Ok(ticket.clone()));

    let id = ticket.id.as_str();
    show("buyTicket", &service.buy_ticket(id));
    show("buyTicket (again)", &service.buy_ticket(id));
    show("revokeTicket as seller-b", &service.revoke_ticket(&stranger, id));
    show("revokeTicket as seller-a", &service.revoke_ticket(&seller, id));
    show("deleteTicket as seller-a", &service.delete_ticket(&seller, id));
    show("getTicket", &service.get_ticket(id));

    let remaining = service.get_tickets()?;
    println!("getTickets -> {} ticket(s) stored", remaining.len());

    println!("\n=== Demo Complete ===");
    Ok(())
}

fn show(request: &str, response: &Result<Ticket, String>) {
    match response {
        Ok(ticket) => {
            let json = serde_json::to_string(ticket).unwrap_or_else(|e| format!("<{e}>"));
            println!("{request}\n  Ok  {json}");
        }
        Err(message) => println!("{request}\n  Err {message}"),
    }
}
