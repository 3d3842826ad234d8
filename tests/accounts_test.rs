mod common;

use anyhow::Result;
use common::test_service;
use duka::application::AppError;

#[tokio::test]
async fn test_register_and_login() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let user = service
        .register("Amina", "amina@example.com", "0747000000", "maji-baridi")
        .await?;

    let logged_in = service.login("amina@example.com", "maji-baridi").await?;
    assert_eq!(logged_in.id, user.id);

    let session = service.current_user().await?;
    assert_eq!(session.map(|u| u.id), Some(user.id));

    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .register("Amina", "amina@example.com", "0747000000", "first")
        .await?;

    let result = service
        .register("Another Amina", "amina@example.com", "0747111111", "second")
        .await;
    assert!(matches!(result, Err(AppError::DuplicateEmail(_))));

    // The first record is unchanged and still authenticates
    let user = service.login("amina@example.com", "first").await?;
    assert_eq!(user.name, "Amina");

    Ok(())
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .register("Amina", "amina@example.com", "0747000000", "correct")
        .await?;

    let wrong = service.login("amina@example.com", "incorrect").await;
    assert!(matches!(wrong, Err(AppError::InvalidCredentials)));

    let unknown = service.login("nobody@example.com", "correct").await;
    assert!(matches!(unknown, Err(AppError::InvalidCredentials)));

    // Neither failure starts a session
    assert!(service.current_user().await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_password_is_stored_hashed() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let user = service
        .register("Amina", "amina@example.com", "0747000000", "maji-baridi")
        .await?;

    assert_ne!(user.password_hash, "maji-baridi");
    assert!(user.password_hash.starts_with("$argon2"));

    Ok(())
}

#[tokio::test]
async fn test_logout_clears_the_session() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .register("Amina", "amina@example.com", "0747000000", "secret")
        .await?;
    service.login("amina@example.com", "secret").await?;
    assert!(service.current_user().await?.is_some());

    service.logout().await?;
    assert!(service.current_user().await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_register_validates_input() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let bad_email = service.register("X", "not-an-email", "", "pw").await;
    assert!(matches!(bad_email, Err(AppError::InvalidArgument(_))));

    let no_password = service.register("X", "x@example.com", "", "").await;
    assert!(matches!(no_password, Err(AppError::InvalidArgument(_))));

    Ok(())
}

#[tokio::test]
async fn test_admin_pin_gate() -> Result<()> {
    let (service, _temp) = test_service().await?;

    // Default PIN is seeded into a fresh store
    service.verify_admin_pin("3604").await?;

    let wrong = service.verify_admin_pin("0000").await;
    assert!(matches!(wrong, Err(AppError::InvalidAdminPin)));

    Ok(())
}
