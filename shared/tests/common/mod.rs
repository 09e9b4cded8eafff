#![allow(dead_code)]

use crux_core::capability::Operation;
use crux_core::testing::AppTester;
use crux_core::Request;

use soil_intake::capabilities::{
    FilePickerOperation, GeolocationOperation, GeolocationOutput, GeolocationResult,
    OpenerOperation, PermissionStatus, Position,
};
use soil_intake::{App, Effect, Event, IntakeConfig, Model, Platform, ViewModel};

pub type Tester = AppTester<App, Effect>;

pub fn entered(platform: Platform, locate_on_enter: bool) -> (Tester, Model, Vec<Effect>) {
    let app = Tester::default();
    let mut model = Model::default();
    let config = IntakeConfig {
        locate_on_enter,
        ..IntakeConfig::default()
    };
    let effects = app
        .update(Event::ScreenEntered { platform, config }, &mut model)
        .effects;
    (app, model, effects)
}

pub fn view(model: &Model) -> ViewModel {
    use crux_core::App as _;
    App.view(model)
}

pub fn has_render(effects: &[Effect]) -> bool {
    effects.iter().any(|e| matches!(e, Effect::Render(_)))
}

pub fn geolocation_requests(effects: Vec<Effect>) -> Vec<Request<GeolocationOperation>> {
    effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::Geolocation(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn file_picker_requests(effects: Vec<Effect>) -> Vec<Request<FilePickerOperation>> {
    effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::FilePicker(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn opener_requests(effects: Vec<Effect>) -> Vec<Request<OpenerOperation>> {
    effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::Opener(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn single<T>(mut items: Vec<T>) -> T {
    assert_eq!(items.len(), 1, "expected exactly one request");
    items.remove(0)
}

/// Resolves a shell request and runs the resulting events through the app,
/// returning every effect they produced.
pub fn resolve<Op: Operation>(
    app: &Tester,
    model: &mut Model,
    request: &mut Request<Op>,
    output: Op::Output,
) -> Vec<Effect> {
    let update = app.resolve(request, output).expect("request should resolve");
    let mut effects = update.effects;
    for event in update.events {
        effects.extend(app.update(event, model).effects);
    }
    effects
}

pub fn permission(status: PermissionStatus) -> GeolocationResult {
    Ok(GeolocationOutput::PermissionStatus(status))
}

pub fn position(latitude: f64, longitude: f64) -> GeolocationResult {
    Ok(GeolocationOutput::Position(Position {
        latitude,
        longitude,
        accuracy_m: Some(8.0),
        timestamp_ms: Some(1_700_000_000_000),
    }))
}
