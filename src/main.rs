use storefront_orders::app_system::{setup_tracing, StoreConfig, StoreSystem};
use storefront_orders::domain::{CatalogDocument, DeliveryDetails, PaymentMethod, ShippingOption};
use tracing::{error, info, warn, Instrument};

/// Catalog documents as they arrive from the catalog source, old and new schema.
const CATALOG: [&str; 3] = [
    r#"{"id":"tshirt-cotton","nama":"T-Shirt Cotton","harga":150000,"gambar":"img/tshirt.png","stok":10,"kategori":"Fashion"}"#,
    r#"{"id":"vitamin-c","name":"Vitamin C 500mg","price":"85000","stock":4,"category":"Health"}"#,
    r#"{"product_id":"rice-5kg","nama":"Beras 5kg","harga":72000,"stok":2}"#,
];

fn delivery(recipient: &str) -> DeliveryDetails {
    DeliveryDetails {
        recipient_name: recipient.to_string(),
        phone_number: "081234567890".to_string(),
        address: "Jl. Braga 12".to_string(),
        city: "Bandung".to_string(),
        postal_code: "40111".to_string(),
        special_instructions: Some("Call on arrival".to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;
    setup_tracing(&config.log_filter);

    info!("Starting storefront order system");
    let system = StoreSystem::new(&config);

    // Log lifecycle events the way a notification emitter would consume them
    let mut events = system.subscribe();
    let listener = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => info!(order_id = %event.order_id(), event = %json, "Lifecycle event"),
                Err(e) => warn!(error = %e, "Could not serialize lifecycle event"),
            }
        }
    });

    // Seed stock and collect product snapshots from the catalog
    let mut products = Vec::new();
    for raw in CATALOG {
        let doc = CatalogDocument::from_json(raw)?;
        system.ledger.register(doc.id.clone(), doc.stock.unwrap_or(0)).await?;
        products.push(doc.snapshot());
    }
    info!(products = products.len(), "Catalog loaded");

    // Customer A: transfer payment with proof, verified by an admin
    let span = tracing::info_span!("customer_a");
    async {
        system.carts.add_item("customer-a", products[0].clone(), 2).await?;
        system.carts.add_item("customer-a", products[1].clone(), 1).await?;

        let order = system
            .orders
            .place_order("customer-a", delivery("Ayu"), ShippingOption::Courier)
            .await?;
        info!(order_id = %order.id, short_code = %order.short_code(), total = %order.total(), "Order placed");

        system
            .orders
            .set_payment_method(&order.id, PaymentMethod::BriTransfer, None)
            .await?;
        system
            .orders
            .attach_payment_proof(&order.id, "payment-proofs/customer-a/transfer.jpg")
            .await?;
        let order = system.orders.confirm_payment(&order.id).await?;
        info!(order_id = %order.id, payment_status = %order.payment_status, "Payment confirmed");
        Ok::<_, storefront_orders::StoreError>(())
    }
    .instrument(span)
    .await?;

    // Customer B: checkout, then cancellation puts the stock back
    let span = tracing::info_span!("customer_b");
    async {
        system.carts.add_item("customer-b", products[2].clone(), 2).await?;
        let order = system
            .orders
            .place_order("customer-b", delivery("Bima"), ShippingOption::StorePickup)
            .await?;
        info!(remaining = system.ledger.available("rice-5kg").await?, "Stock after checkout");

        let cancelled = system.orders.cancel_order(&order.id).await?;
        info!(
            order_id = %cancelled.id,
            remaining = system.ledger.available("rice-5kg").await?,
            "Order cancelled"
        );
        Ok::<_, storefront_orders::StoreError>(())
    }
    .instrument(span)
    .await?;

    // Customer C: asks for more than is left
    let span = tracing::info_span!("customer_c");
    async {
        system.carts.add_item("customer-c", products[1].clone(), 10).await?;
        match system
            .orders
            .place_order("customer-c", delivery("Citra"), ShippingOption::Courier)
            .await
        {
            Ok(order) => info!(order_id = %order.id, "Order placed"),
            Err(e) => error!(error = %e, message = %e.user_message(), "Checkout failed"),
        }
        Ok::<_, storefront_orders::StoreError>(())
    }
    .instrument(span)
    .await?;

    system.shutdown().await?;
    listener.abort();

    info!("Application completed successfully");
    Ok(())
}
