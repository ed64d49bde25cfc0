use menuqr_onboarding::{
    ClientConfig, InMemoryLocalStore, InMemoryOnboardingApi, LocalStore, MenuSetupPatch,
    OnboardingController, OnboardingResult, RestaurantInfoPatch, ThemePatch,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

async fn run_inmemory_demo() -> OnboardingResult<()> {
    println!("== In-memory onboarding demo ==");
    let config = ClientConfig::default();
    let store: Arc<dyn LocalStore> = Arc::new(InMemoryLocalStore::new());
    let controller = OnboardingController::new(InMemoryOnboardingApi::new(), store, &config);

    if !controller.mount().await? {
        let state = controller.start_onboarding().await?;
        println!("Started session {:?}", state.session_id);
    }

    controller.next_step().await?;
    controller.update_restaurant_info(RestaurantInfoPatch {
        name: Some("Casa Demo".into()),
        owner_name: Some("Demo Owner".into()),
        cuisine_types: Some(vec!["mexican".into()]),
        ..Default::default()
    });
    controller.next_step().await?;
    println!("Restaurant info saved, now at {}", controller.current_step());

    controller.update_menu_setup(MenuSetupPatch {
        categories: Some(vec!["Tacos".into(), "Drinks".into()]),
        include_sample_items: Some(true),
    });
    controller.next_step().await?;

    controller.update_theme(ThemePatch {
        theme: Some("vibrant".into()),
        primary_color: Some("#E11D48".into()),
        ..Default::default()
    });
    controller.next_step().await?;
    println!(
        "Reached {} ({:.0}% done)",
        controller.current_step(),
        controller.progress() * 100.0
    );

    let payload = controller.complete_onboarding().await?;
    println!(
        "Onboarding completed, redirect to {}",
        payload.redirect_to.as_deref().unwrap_or("/")
    );
    Ok(())
}

#[tokio::main]
async fn main() -> OnboardingResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    run_inmemory_demo().await
}
