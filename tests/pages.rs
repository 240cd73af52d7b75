use chrono::NaiveDate;
use mesa_pos::catalog::{filter_products, CategoryFilter};
use mesa_pos::error::Error;
use mesa_pos::history::{HistoryFilter, SortField, SortState};
use mesa_pos::models::{
    CategoryForm, CategoryStatus, OrderStatus, ProductForm, ProductOptionForm, ProductStatus,
    TableForm, TableShape, TableStatus,
};
use mesa_pos::Pos;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pos(server: &MockServer) -> Pos {
    Pos::new(&server.uri(), "anon-key").unwrap()
}

#[tokio::test]
async fn table_create_round_trips_through_refetch() {
    let server = MockServer::start().await;
    let pos = pos(&server);

    let form = TableForm {
        name: "Terraza 1".into(),
        capacity: 6,
        status: TableStatus::Free,
        code: "T1".into(),
        shape: Some(TableShape::Rectangle),
    };

    Mock::given(method("POST"))
        .and(path("/rest/v1/tables"))
        .and(body_json(json!({
            "name": "Terraza 1", "capacity": 6, "status": "libre", "code": "T1", "shape": "rectangle"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "id": 11, "name": "Terraza 1", "capacity": 6, "status": "libre", "code": "T1", "shape": "rectangle" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/tables"))
        .and(query_param("order", "id.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Mesa 1", "capacity": 4, "status": "ocupada", "code": "M1" },
            { "id": 11, "name": "Terraza 1", "capacity": 6, "status": "libre", "code": "T1", "shape": "rectangle" }
        ])))
        .mount(&server)
        .await;

    let tables = pos.tables().save(None, &form).await.unwrap();

    let created = tables.iter().find(|t| t.id == 11).unwrap();
    assert_eq!(TableForm::from(created), form);
}

#[tokio::test]
async fn invalid_form_is_not_sent() {
    let server = MockServer::start().await;
    let pos = pos(&server);

    let form = CategoryForm {
        name: "x".repeat(51),
        color: "#000".into(),
        icon: "🍰".into(),
        status: CategoryStatus::Active,
    };

    match pos.categories().save(None, &form).await {
        Err(Error::Validation(errors)) => assert!(errors.get("name").is_some()),
        other => panic!("expected a validation error, got {:?}", other),
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn table_toggle_flips_status_without_checking_orders() {
    let server = MockServer::start().await;
    let pos = pos(&server);

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/tables"))
        .and(query_param("id", "eq.4"))
        .and(body_json(json!({ "status": "libre" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 4, "name": "Mesa 4", "capacity": 2, "status": "libre", "code": "M4" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/tables"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 4, "name": "Mesa 4", "capacity": 2, "status": "libre", "code": "M4" }
        ])))
        .mount(&server)
        .await;

    let reserved = serde_json::from_value(json!({
        "id": 4, "name": "Mesa 4", "capacity": 2, "status": "reservada", "code": "M4"
    }))
    .unwrap();

    let tables = pos.tables().toggle_status(&reserved).await.unwrap();
    assert_eq!(tables[0].status, TableStatus::Free);

    // no order lookups were made
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() == "/rest/v1/tables"));
}

#[tokio::test]
async fn updating_a_missing_row_is_not_found() {
    let server = MockServer::start().await;
    let pos = pos(&server);

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let form = ProductForm {
        name: "Causa limeña".into(),
        base_price: 18.0,
        ..ProductForm::default()
    };

    assert!(matches!(
        pos.products().save(Some(999), &form).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn category_delete_then_refetch() {
    let server = MockServer::start().await;
    let pos = pos(&server);

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/categories"))
        .and(query_param("id", "eq.2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 2, "name": "Postres", "color": "#f0f", "icon": "🍮", "status": "activa" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/categories"))
        .and(query_param("order", "name.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Bebidas", "color": "#00f", "icon": "🥤", "status": "activa" }
        ])))
        .mount(&server)
        .await;

    let categories = pos.categories().delete(2).await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "Bebidas");
}

#[tokio::test]
async fn product_list_filters_by_category() {
    let server = MockServer::start().await;
    let pos = pos(&server);

    Mock::given(method("GET"))
        .and(path("/rest/v1/products"))
        .and(query_param("select", "*, categories(name)"))
        .and(query_param("order", "id.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Ceviche", "base_price": 32.0, "status": "activo", "category_id": 1, "stock": 4, "categories": { "name": "Entradas" } },
            { "id": 2, "name": "Inca Kola", "base_price": 5.0, "status": "activo", "category_id": 2, "stock": 40, "categories": { "name": "Bebidas" } },
            { "id": 3, "name": "Tiradito", "base_price": 29.0, "status": "inactivo", "category_id": 1, "categories": { "name": "Entradas" } }
        ])))
        .mount(&server)
        .await;

    let products = pos.products().list().await.unwrap();

    let entradas = filter_products(&products, CategoryFilter::parse(Some("1")));
    assert_eq!(entradas.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(filter_products(&products, CategoryFilter::parse(Some("all"))).len(), 3);

    assert!(products[0].is_low_stock());
    assert_eq!(products[1].category_name(), Some("Bebidas"));
    assert_eq!(products[2].status, ProductStatus::Inactive);
}

#[tokio::test]
async fn product_options_for_product() {
    let server = MockServer::start().await;
    let pos = pos(&server);

    Mock::given(method("GET"))
        .and(path("/rest/v1/product_options"))
        .and(query_param("product_id", "eq.5"))
        .and(query_param("is_available", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Arroz extra", "additional_price": 4.0, "product_id": 5, "is_available": true }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/product_options"))
        .and(body_json(json!({
            "name": "Papas fritas", "additional_price": 6.0, "product_id": 5, "is_available": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": 2 }])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/product_options"))
        .and(query_param("order", "name.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let options = pos.product_options().list_for_product(5).await.unwrap();
    assert_eq!(options[0].name, "Arroz extra");

    let form = ProductOptionForm {
        name: "Papas fritas".into(),
        additional_price: 6.0,
        product_id: Some(5),
        is_available: true,
    };
    pos.product_options().save(None, &form).await.unwrap();
}

#[tokio::test]
async fn floor_pairs_tables_with_active_orders() {
    let server = MockServer::start().await;
    let pos = pos(&server);

    Mock::given(method("GET"))
        .and(path("/rest/v1/tables"))
        .and(query_param("status", "neq.en mantenimiento"))
        .and(query_param("order", "name.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Mesa 1", "capacity": 4, "status": "ocupada", "code": "M1" },
            { "id": 2, "name": "Mesa 2", "capacity": 2, "status": "libre", "code": "M2" }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/orders"))
        .and(query_param(
            "status",
            "in.(pendiente,pending,\"en preparación\",preparing,in_progress,servido,served,\"pendiente de pago\",pending_payment)",
        ))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 5, "table_id": 1, "status": "en preparación",
                "start_time": "2024-05-01T12:00:00+00:00",
                "user": { "id": "u1", "first_name": "Rosa", "last_name": "Quispe" },
                "order_items": [{
                    "id": 50, "order_id": 5, "product_id": 1, "quantity": 2,
                    "product": { "id": 1, "name": "Ceviche", "base_price": 32.0, "status": "activo" }
                }]
            }
        ])))
        .mount(&server)
        .await;

    let view = pos.floor().load().await.unwrap();

    assert_eq!(view.cards.len(), 2);
    let first = &view.cards[0];
    assert_eq!(first.order.as_ref().unwrap().status, OrderStatus::InPreparation);
    assert_eq!(
        first.order.as_ref().unwrap().user.as_ref().unwrap().display_name(),
        "Rosa Quispe"
    );
    assert!(view.cards[1].order.is_none());

    let summary = view.summary();
    assert_eq!(summary.open_orders, 1);
    assert_eq!(mesa_pos::money::to_f64(summary.open_amount), 64.0);
}

#[tokio::test]
async fn history_applies_filters_and_sort() {
    let server = MockServer::start().await;
    let pos = pos(&server);

    Mock::given(method("GET"))
        .and(path("/rest/v1/orders"))
        .and(query_param("status", "in.(cerrado,completed,closed)"))
        .and(query_param("created_at", "gte.2024-05-01"))
        .and(query_param("created_at", "lte.2024-05-31T23:59:59"))
        .and(query_param("table_id", "eq.3"))
        .and(query_param("order", "status.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 9, "table_id": 3, "status": "completed", "tables": { "id": 3, "name": "Mesa 3", "code": "M3" } },
            { "id": 8, "table_id": 3, "status": "cerrado", "tables": { "id": 3, "name": "Mesa 3", "code": "M3" } }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let filter = HistoryFilter {
        status: Some(OrderStatus::Closed),
        date_from: NaiveDate::from_ymd_opt(2024, 5, 1),
        date_to: NaiveDate::from_ymd_opt(2024, 5, 31),
        table_id: Some(3),
    };
    let sort = SortState::default().select(SortField::Status);

    let orders = pos.history().fetch(&filter, sort).await.unwrap();

    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o.status == OrderStatus::Closed));
    assert_eq!(mesa_pos::history::table_label(&orders[0]), "Mesa 3");
}
