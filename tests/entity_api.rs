//! HTTP-level tests for the table-driven CRUD endpoints, sent straight to the router.

mod common;

use axum::http::StatusCode;
use common::{body_json, client_body, create_client, delete, get, meta_body, post_json, put_json};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn test_create_client_returns_201(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let response = post_json(app, "/clients/", client_body("Dupont")).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["id"].as_i64().unwrap() > 0);
    assert_eq!(json["nom"], "Dupont");
    assert_eq!(json["date_creation_compte"], "2021-03-04");
}

#[sqlx::test(migrations = false)]
async fn test_create_accepts_data_envelope(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let response = post_json(app, "/clients", json!({"data": client_body("Leroy")})).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["nom"], "Leroy");
}

#[sqlx::test(migrations = false)]
async fn test_get_client_by_id(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let id = create_client(app.clone(), "Martin").await;

    let response = get(app, &format!("/clients/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["id"], id);
    assert_eq!(json["nom"], "Martin");
    assert_eq!(json["prenom"], "Marie");
}

#[sqlx::test(migrations = false)]
async fn test_client_meta_reads_back_as_written(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let client_id = create_client(app.clone(), "Dupont").await;
    let body = meta_body(client_id);

    let response = post_json(app.clone(), "/client_meta/", body.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_i64().unwrap();

    let mut expected = body;
    expected["id"] = json!(id);
    expected["situation_familiale"] = json!(null);
    assert_eq!(created, expected);

    let fetched = body_json(get(app, &format!("/client_meta/{id}")).await).await;
    assert_eq!(fetched, expected);
}

#[sqlx::test(migrations = false)]
async fn test_client_situation_reads_back_with_nulls(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let client_id = create_client(app.clone(), "Dupont").await;
    let body = json!({
        "client_id": client_id,
        "revenu_estime_mois": 3200,
        "historique_credits": null,
        "risque_personnel": 0.35,
        "score_credit": 712.5,
        "loyer_mensuel": null
    });

    let response = post_json(app.clone(), "/client_situation/", body.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_i64().unwrap();

    let mut expected = body;
    expected["id"] = json!(id);
    assert_eq!(created, expected);

    let fetched = body_json(get(app, &format!("/client_situation/{id}")).await).await;
    assert_eq!(fetched, expected);
}

#[sqlx::test(migrations = false)]
async fn test_get_missing_item_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let response = get(app, "/clients/9999").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "not_found");
}

#[sqlx::test(migrations = false)]
async fn test_unknown_table_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool).await;

    let response = get(app.clone(), "/loans/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_json(app, "/loans/", json!({"x": 1})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn test_bad_date_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let body = json!({"nom": "Dupont", "prenom": "Marie", "date_creation_compte": "04/03/2021"});
    let response = post_json(app.clone(), "/clients/", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"]["message"].as_str().unwrap().contains("date_creation_compte"));

    // Nothing was written.
    let list = body_json(get(app, "/clients/").await).await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[sqlx::test(migrations = false)]
async fn test_padded_date_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let body = json!({"nom": "Dupont", "prenom": "Marie", "date_creation_compte": " 2023-01-15 "});
    let response = post_json(app, "/clients/", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = false)]
async fn test_unknown_field_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let mut body = client_body("Dupont");
    body["couleur"] = json!("bleu");
    let response = post_json(app, "/clients/", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = false)]
async fn test_missing_required_field_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let response = post_json(app, "/clients/", json!({"nom": "Dupont"})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = false)]
async fn test_child_of_missing_client_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let response = post_json(app, "/contrats/", json!({"client_id": 424242, "montant_pret": 1000.0})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = false)]
async fn test_second_meta_for_same_client_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let id = create_client(app.clone(), "Dupont").await;

    let first = post_json(app.clone(), "/client_meta/", meta_body(id)).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let second = post_json(app, "/client_meta/", meta_body(id)).await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn test_list_paginates_in_id_order(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    for nom in ["A", "B", "C", "D", "E"] {
        create_client(app.clone(), nom).await;
    }

    let all = body_json(get(app.clone(), "/clients/").await).await;
    let noms: Vec<&str> = all.as_array().unwrap().iter().map(|r| r["nom"].as_str().unwrap()).collect();
    assert_eq!(noms, ["A", "B", "C", "D", "E"]);

    let page = body_json(get(app.clone(), "/clients/?skip=1&limit=2").await).await;
    let noms: Vec<&str> = page.as_array().unwrap().iter().map(|r| r["nom"].as_str().unwrap()).collect();
    assert_eq!(noms, ["B", "C"]);

    let past_end = body_json(get(app.clone(), "/clients/?skip=10").await).await;
    assert_eq!(past_end, json!([]));

    let response = get(app, "/clients/?limit=-3").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = false)]
async fn test_pagination_beyond_bigint_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool).await;

    let response = get(app.clone(), "/clients/?limit=18446744073709551615").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "bad_request");

    let response = get(app.clone(), "/clients/?skip=9223372036854775808").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(app, "/clients/?skip=9223372036854775807&limit=9223372036854775807").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn test_update_overwrites_only_supplied_fields(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let id = create_client(app.clone(), "Dupont").await;

    let response = put_json(app.clone(), &format!("/clients/{id}"), json!({"nom": "Durand"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["nom"], "Durand");
    assert_eq!(json["prenom"], "Marie");
    assert_eq!(json["date_creation_compte"], "2021-03-04");

    let response = put_json(app, &format!("/clients/{id}"), json!({"date_creation_compte": "2022-01-15"})).await;
    assert_eq!(body_json(response).await["date_creation_compte"], "2022-01-15");
}

#[sqlx::test(migrations = false)]
async fn test_update_missing_item_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let response = put_json(app, "/clients/9999", json!({"nom": "Durand"})).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = false)]
async fn test_update_with_bad_date_returns_400_and_keeps_row(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let id = create_client(app.clone(), "Dupont").await;

    let response = put_json(app.clone(), &format!("/clients/{id}"), json!({"date_creation_compte": "2022-13-45"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(get(app, &format!("/clients/{id}")).await).await;
    assert_eq!(json["date_creation_compte"], "2021-03-04");
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn test_delete_then_get_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let id = create_client(app.clone(), "Dupont").await;

    let response = delete(app.clone(), &format!("/clients/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"detail": "Item deleted successfully"}));

    let response = get(app.clone(), &format!("/clients/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete(app, &format!("/clients/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = false)]
async fn test_delete_client_cascades_to_children(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let id = create_client(app.clone(), "Dupont").await;
    let other = create_client(app.clone(), "Martin").await;

    let meta = body_json(post_json(app.clone(), "/client_meta/", meta_body(id)).await).await;
    let contrat = body_json(
        post_json(app.clone(), "/contrats/", json!({"client_id": id, "montant_pret": 12000.0})).await,
    )
    .await;
    post_json(app.clone(), "/contrats/", json!({"client_id": other, "montant_pret": 5000.0})).await;

    let response = delete(app.clone(), &format!("/clients/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(app.clone(), &format!("/client_meta/{}", meta["id"])).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = get(app.clone(), &format!("/contrats/{}", contrat["id"])).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let remaining = body_json(get(app, "/contrats/").await).await;
    assert_eq!(remaining.as_array().unwrap().len(), 1);
    assert_eq!(remaining[0]["client_id"], other);
}

// ---------------------------------------------------------------------------
// Common routes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn test_ready_lists_tables(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let response = get(app, "/ready").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["tables"], json!(["clients", "client_meta", "client_situation", "contrats"]));
}

#[sqlx::test(migrations = false)]
async fn test_schema_is_applied_idempotently(pool: PgPool) {
    let config = lending_crud::builtin_model().unwrap();
    lending_crud::apply_schema(&pool, &config).await.unwrap();
    lending_crud::apply_schema(&pool, &config).await.unwrap();
}
