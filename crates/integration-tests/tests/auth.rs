//! Sign-in, registration, password reset and the cart hand-off between
//! guest and user carts.

#![allow(clippy::unwrap_used)]

use serde_json::{Value, json};
use tienda_core::{Email, Phone};
use tienda_integration_tests::{PASSWORD, TestContext, lines};
use tienda_storefront::auth::{InMemoryIdentityProvider, OtpTarget};

#[tokio::test]
async fn test_login_with_wrong_password() {
    let ctx = TestContext::new().await;
    ctx.seed_user("ana@correo.mx", "Ana").await;

    let resp = ctx.login(&ctx.client, "ana@correo.mx", "incorrecta").await;
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Correo o contraseña incorrectos.");

    let session: Value = ctx
        .get(&ctx.client, "/api/auth/session")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(session["logged_in"], false);
}

#[tokio::test]
async fn test_login_validates_before_calling_provider() {
    let ctx = TestContext::new().await;

    let resp = ctx.login(&ctx.client, "", "").await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Completa todos los campos.");

    let resp = ctx.login(&ctx.client, "no-es-correo", PASSWORD).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Ingresa un correo electrónico válido.");
}

#[tokio::test]
async fn test_login_returns_user_projection() {
    let ctx = TestContext::new().await;
    ctx.seed_user("ana@correo.mx", "Ana").await;

    let resp = ctx.login(&ctx.client, "  ana@correo.mx ", PASSWORD).await;
    assert_eq!(resp.status(), 200);
    let session: Value = resp.json().await.unwrap();

    assert_eq!(session["logged_in"], true);
    assert_eq!(session["event"], "SIGNED_IN");
    assert_eq!(session["user"]["nombre"], "Ana");
    assert_eq!(session["user"]["email"], "ana@correo.mx");
    assert_eq!(session["user"]["rol"], "cliente");

    // The session survives across requests.
    let session: Value = ctx
        .get(&ctx.client, "/api/auth/session")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(session["logged_in"], true);
    assert_eq!(session["event"], "INITIAL_SESSION");
}

#[tokio::test]
async fn test_login_merges_guest_cart() {
    let ctx = TestContext::new().await;
    ctx.seed_user("ana@correo.mx", "Ana").await;

    // A previous visit left products in the user's cart.
    let laptop = TestContext::browser();
    ctx.login(&laptop, "ana@correo.mx", PASSWORD).await;
    ctx.add_to_cart(&laptop, 1, 1).await;
    ctx.add_to_cart(&laptop, 4, 2).await;

    // Shopping as a guest on another device.
    ctx.add_to_cart(&ctx.client, 4, 3).await;
    ctx.add_to_cart(&ctx.client, 2, 1).await;

    let session: Value = ctx
        .login(&ctx.client, "ana@correo.mx", PASSWORD)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(session["cart_count"], 7);

    let cart = ctx.cart(&ctx.client).await;
    assert_eq!(lines(&cart), vec![(1, 1), (4, 5), (2, 1)]);

    // The guest cart is gone, only the user cart remains.
    let keys = ctx.carts.keys().await;
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with("telcel_cart:user:"));

    // Both devices now see the same cart.
    assert_eq!(lines(&ctx.cart(&laptop).await), lines(&cart));
}

#[tokio::test]
async fn test_logout_falls_back_to_guest_cart() {
    let ctx = TestContext::new().await;
    ctx.seed_user("ana@correo.mx", "Ana").await;

    ctx.add_to_cart(&ctx.client, 1, 1).await;
    ctx.login(&ctx.client, "ana@correo.mx", PASSWORD).await;
    assert_eq!(lines(&ctx.cart(&ctx.client).await), vec![(1, 1)]);

    let resp = ctx.post(&ctx.client, "/api/auth/logout", json!({})).await;
    assert_eq!(resp.status(), 200);
    let session: Value = resp.json().await.unwrap();
    assert_eq!(session["logged_in"], false);
    assert_eq!(session["event"], "SIGNED_OUT");
    assert_eq!(session["cart_count"], 0);

    // The guest cart was merged away on login.
    assert!(lines(&ctx.cart(&ctx.client).await).is_empty());

    // Signing back in restores the user's cart without duplicating it.
    ctx.login(&ctx.client, "ana@correo.mx", PASSWORD).await;
    assert_eq!(lines(&ctx.cart(&ctx.client).await), vec![(1, 1)]);
}

#[tokio::test]
async fn test_logout_when_signed_out_is_harmless() {
    let ctx = TestContext::new().await;

    let resp = ctx.post(&ctx.client, "/api/auth/logout", json!({})).await;
    assert_eq!(resp.status(), 200);
    let session: Value = resp.json().await.unwrap();
    assert_eq!(session["logged_in"], false);
}

#[tokio::test]
async fn test_register_signs_in_and_stores_profile() {
    let ctx = TestContext::new().await;
    ctx.add_to_cart(&ctx.client, 4, 1).await;

    let resp = ctx
        .post(
            &ctx.client,
            "/api/auth/register",
            json!({
                "nombre": "Luis",
                "apellido_paterno": "Hernández",
                "apellido_materno": "",
                "correo": "luis@correo.mx",
                "contrasena": "secreto1",
                "confirmar_contrasena": "secreto1"
            }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();

    assert_eq!(body["status"], "signed_in");
    assert_eq!(body["session"]["logged_in"], true);
    assert_eq!(body["session"]["user"]["nombre"], "Luis");
    // The guest cart follows the new account.
    assert_eq!(body["session"]["cart_count"], 1);

    let user_id = serde_json::from_value(body["session"]["user"]["id"].clone()).unwrap();
    let profile = ctx.provider.profile(user_id).await.unwrap();
    assert_eq!(profile.apellido_paterno, "Hernández");
    assert_eq!(profile.correo, "luis@correo.mx");
}

#[tokio::test]
async fn test_register_with_email_confirmation() {
    let ctx = TestContext::with_provider(InMemoryIdentityProvider::new().with_email_confirmation())
        .await;

    let body: Value = ctx
        .post(
            &ctx.client,
            "/api/auth/register",
            json!({
                "nombre": "Luis",
                "apellido_paterno": "Hernández",
                "correo": "luis@correo.mx",
                "contrasena": "secreto1",
                "confirmar_contrasena": "secreto1"
            }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "confirmation_required");
    assert_eq!(body["email"], "luis@correo.mx");

    let resp = ctx.login(&ctx.client, "luis@correo.mx", "secreto1").await;
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Debes confirmar tu correo electrónico antes de iniciar sesión."
    );
}

#[tokio::test]
async fn test_register_rejects_bad_input_and_duplicates() {
    let ctx = TestContext::new().await;
    ctx.seed_user("ana@correo.mx", "Ana").await;

    let form = |correo: &str, contrasena: &str, confirmacion: &str| {
        json!({
            "nombre": "Ana",
            "apellido_paterno": "López",
            "correo": correo,
            "contrasena": contrasena,
            "confirmar_contrasena": confirmacion
        })
    };

    let resp = ctx
        .post(&ctx.client, "/api/auth/register", form("otra@correo.mx", "secreto1", "secreto2"))
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Las contraseñas no coinciden.");

    let resp = ctx
        .post(&ctx.client, "/api/auth/register", form("otra@correo.mx", "corta", "corta"))
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "La contraseña debe tener al menos 6 caracteres.");

    let resp = ctx
        .post(&ctx.client, "/api/auth/register", form("ana@correo.mx", "secreto1", "secreto1"))
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Ya existe una cuenta registrada con este correo.");
}

#[tokio::test]
async fn test_password_reset_by_email_code() {
    let ctx = TestContext::new().await;
    ctx.seed_user("ana@correo.mx", "Ana").await;

    let resp = ctx
        .post(
            &ctx.client,
            "/api/auth/password/reset-request",
            json!({"correo": "ana@correo.mx"}),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Te enviamos un código de verificación a tu correo."
    );

    let target = OtpTarget::Email(Email::parse("ana@correo.mx").unwrap());
    let code = ctx.provider.last_otp(&target).await.unwrap();

    let resp = ctx
        .post(
            &ctx.client,
            "/api/auth/password/reset-confirm",
            json!({
                "correo": "ana@correo.mx",
                "codigo": code,
                "nueva_contrasena": "nuevo123",
                "confirmar_contrasena": "nuevo123"
            }),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Tu contraseña se actualizó. Inicia sesión con tu nueva contraseña."
    );

    // The reset leaves the client signed out.
    let session: Value = ctx
        .get(&ctx.client, "/api/auth/session")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(session["logged_in"], false);

    assert_eq!(
        ctx.login(&ctx.client, "ana@correo.mx", PASSWORD).await.status(),
        401
    );
    assert_eq!(
        ctx.login(&ctx.client, "ana@correo.mx", "nuevo123").await.status(),
        200
    );
}

#[tokio::test]
async fn test_password_reset_with_wrong_code() {
    let ctx = TestContext::new().await;
    ctx.seed_user("ana@correo.mx", "Ana").await;

    ctx.post(
        &ctx.client,
        "/api/auth/password/reset-request",
        json!({"correo": "ana@correo.mx"}),
    )
    .await;

    let resp = ctx
        .post(
            &ctx.client,
            "/api/auth/password/reset-confirm",
            json!({
                "correo": "ana@correo.mx",
                "codigo": "not-the-code",
                "nueva_contrasena": "nuevo123",
                "confirmar_contrasena": "nuevo123"
            }),
        )
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "El código es inválido o ha expirado.");
}

#[tokio::test]
async fn test_password_reset_request_validation() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post(
            &ctx.client,
            "/api/auth/password/reset-request",
            json!({"correo": "ana@correo.mx", "telefono": "5512345678"}),
        )
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Ingresa tu correo o tu teléfono, no ambos.");

    let resp = ctx
        .post(
            &ctx.client,
            "/api/auth/password/reset-request",
            json!({"correo": "nadie@correo.mx"}),
        )
        .await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "No existe una cuenta asociada a este correo.");
}

#[tokio::test]
async fn test_password_reset_link() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post(
            &ctx.client,
            "/api/auth/password/reset-link",
            json!({"correo": "ana@correo.mx"}),
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Te enviamos un enlace para restablecer tu contraseña."
    );
}

#[tokio::test]
async fn test_reset_confirm_without_target_requires_session() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post(
            &ctx.client,
            "/api/auth/password/reset-confirm",
            json!({
                "nueva_contrasena": "nuevo123",
                "confirmar_contrasena": "nuevo123"
            }),
        )
        .await;
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_update_phone_then_reset_by_sms() {
    let ctx = TestContext::new().await;
    ctx.seed_user("ana@correo.mx", "Ana").await;

    let resp = ctx
        .post(&ctx.client, "/api/auth/phone", json!({"telefono": "55 1234 5678"}))
        .await;
    assert_eq!(resp.status(), 401);

    ctx.login(&ctx.client, "ana@correo.mx", PASSWORD).await;
    let resp = ctx
        .post(&ctx.client, "/api/auth/phone", json!({"telefono": "123"}))
        .await;
    assert_eq!(resp.status(), 400);

    let resp = ctx
        .post(&ctx.client, "/api/auth/phone", json!({"telefono": "55 1234 5678"}))
        .await;
    assert_eq!(resp.status(), 200);
    let session: Value = resp.json().await.unwrap();
    assert_eq!(session["event"], "USER_UPDATED");
    assert_eq!(session["user"]["phone"], "+525512345678");

    let resp = ctx
        .post(
            &ctx.client,
            "/api/auth/password/reset-request",
            json!({"telefono": "5512345678"}),
        )
        .await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Te enviamos un código de verificación por SMS.");

    let phone = Phone::parse("5512345678").unwrap();
    let code = ctx.provider.last_otp(&OtpTarget::Phone(phone)).await;
    assert!(code.is_some());
}

#[tokio::test]
async fn test_expired_session_is_refreshed() {
    let provider = InMemoryIdentityProvider::new().with_session_ttl(chrono::Duration::seconds(-60));
    let ctx = TestContext::with_provider(provider).await;
    ctx.seed_user("ana@correo.mx", "Ana").await;

    ctx.login(&ctx.client, "ana@correo.mx", PASSWORD).await;
    ctx.add_to_cart(&ctx.client, 1, 1).await;

    let session: Value = ctx
        .get(&ctx.client, "/api/auth/session")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(session["logged_in"], true);
    assert_eq!(session["cart_count"], 1);
}

#[tokio::test]
async fn test_refreshed_session_survives_failed_requests() {
    let provider = InMemoryIdentityProvider::new().with_session_ttl(chrono::Duration::seconds(-60));
    let ctx = TestContext::with_provider(provider).await;
    ctx.seed_user("ana@correo.mx", "Ana").await;
    ctx.login(&ctx.client, "ana@correo.mx", PASSWORD).await;

    // Each request refreshes the expired session, then fails.
    let resp = ctx.add_to_cart(&ctx.client, 999, 1).await;
    assert_eq!(resp.status(), 404);

    let resp = ctx
        .post(
            &ctx.client,
            "/api/auth/password/reset-request",
            json!({"correo": "nadie@correo.mx"}),
        )
        .await;
    assert_eq!(resp.status(), 400);

    let resp = ctx
        .post(&ctx.client, "/api/auth/phone", json!({"telefono": "123"}))
        .await;
    assert_eq!(resp.status(), 400);

    let resp = ctx
        .post(&ctx.client, "/api/cart/items", json!({"product_id": 1, "quantity": -1}))
        .await;
    assert_eq!(resp.status(), 400);

    let session: Value = ctx
        .get(&ctx.client, "/api/auth/session")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(session["logged_in"], true);
    assert_eq!(session["user"]["email"], "ana@correo.mx");
}
