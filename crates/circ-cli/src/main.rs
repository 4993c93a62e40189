use circ_core::domain::{BookSpec, PageOptions, UserRole, UserSpec};
use circ_core::{Catalog, Circulation, InMemoryLibrary};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // (A) An empty library with the system clock.
    let library = InMemoryLibrary::new();

    // (B) Seed the directory and the catalog.
    let librarian = library
        .register_user(UserSpec::with_role("Bea Santos", UserRole::Librarian))
        .await;
    let member = library.register_user(UserSpec::member("Alice Moreau")).await;

    let book = library
        .create_book(
            BookSpec::new("The Dispossessed", "Ursula K. Le Guin", "9780061054884")
                .with_copies(2),
        )
        .await
        .expect("seed book");
    println!(
        "catalog: {} by {} ({} copies)",
        book.title, book.author, book.total_copies
    );

    // (C) One full reserve -> pickup -> return cycle.
    let reservation = library
        .reserve_book(member.id, book.id)
        .await
        .expect("reserve");
    println!(
        "reserved: loan={} status={} pickup by {:?}",
        reservation.id, reservation.status, reservation.pickup_deadline
    );

    let active = library
        .confirm_pickup(librarian.id, reservation.id)
        .await
        .expect("pickup");
    println!(
        "picked up: status={} due {:?}",
        active.status, active.due_date
    );

    let returned = library
        .return_book(librarian.id, reservation.id)
        .await
        .expect("return");
    println!(
        "returned: status={} fine={}",
        returned.status, returned.fine_amount
    );

    // (D) Snapshot what the staff sees.
    let shelf = library
        .get_book(book.id)
        .await
        .expect("book still in catalog");
    println!(
        "shelf: {}/{} copies available",
        shelf.available_copies, shelf.total_copies
    );

    let loans = library
        .list_all_loans(librarian.id, PageOptions::default())
        .await
        .expect("list loans");
    let counts = library.counts_by_status().await.expect("counts");
    println!("loans on file: {}", loans.len());
    println!(
        "counts: {}",
        serde_json::to_string_pretty(&counts).expect("serialize counts")
    );
}
