mod common;

use assert_matches::assert_matches;
use common::*;

use soil_intake::capabilities::{
    BrowserFile, FilePickerError, FilePickerOperation, FilePickerOutput, GeolocationError,
    GeolocationOperation, NativeDocument, OpenTarget, OpenerError, OpenerOperation, OpenerOutput,
    PermissionStatus,
};
use soil_intake::model::{CropType, LocationState};
use soil_intake::view::{LocationView, NO_CROP_NOTICE, NO_FILE_NOTICE};
use soil_intake::{ErrorKind, Event, IntakeConfig, Model, Platform};

fn native_report(name: &str) -> FilePickerOutput {
    FilePickerOutput::Native(NativeDocument {
        uri: format!("file:///data/user/0/cache/{name}"),
        name: Some(name.to_string()),
        mime_type: Some("application/pdf".into()),
        size_bytes: Some(4096),
    })
}

fn pick(app: &Tester, model: &mut Model, output: Result<FilePickerOutput, FilePickerError>) -> Vec<soil_intake::Effect> {
    let effects = app.update(Event::FileRequested, model).effects;
    let mut request = single(file_picker_requests(effects));
    resolve(app, model, &mut request, output)
}

mod screen_entry {
    use super::*;

    #[test]
    fn test_native_entry_checks_permission_first() {
        let (_app, model, effects) = entered(Platform::Native, true);

        assert!(has_render(&effects));
        assert!(model.session_id().is_some());
        assert_eq!(model.session().location(), &LocationState::Pending);

        let request = single(geolocation_requests(effects));
        assert_eq!(request.operation, GeolocationOperation::CheckPermission);
    }

    #[test]
    fn test_web_entry_requests_position_directly() {
        let (_app, _model, effects) = entered(Platform::Web, true);

        let request = single(geolocation_requests(effects));
        assert_matches!(
            &request.operation,
            GeolocationOperation::GetCurrentPosition { options } if options.timeout_ms == 30_000
        );
    }

    #[test]
    fn test_entry_without_implicit_attempt() {
        let (_app, model, effects) = entered(Platform::Native, false);

        assert!(geolocation_requests(effects).is_empty());
        assert_eq!(model.session().location(), &LocationState::Unresolved);
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let app = Tester::default();
        let mut model = Model::default();
        let config = IntakeConfig {
            location_timeout_ms: 5,
            ..IntakeConfig::default()
        };

        app.update(
            Event::ScreenEntered {
                platform: Platform::Web,
                config,
            },
            &mut model,
        );

        assert_eq!(model.config(), &IntakeConfig::default());
        assert!(model.active_error().is_none());
    }

    #[test]
    fn test_reentry_starts_a_fresh_session() {
        let (app, mut model, _) = entered(Platform::Native, false);
        app.update(
            Event::CropSelected {
                value: "Wheat".into(),
            },
            &mut model,
        );
        let first = model.session_id();

        app.update(
            Event::ScreenEntered {
                platform: Platform::Native,
                config: IntakeConfig::default(),
            },
            &mut model,
        );

        assert_ne!(model.session_id(), first);
        assert_eq!(model.session().crop_type(), None);
    }
}

mod location {
    use super::*;

    #[test]
    fn test_native_prompt_then_grant_resolves() {
        let (app, mut model, effects) = entered(Platform::Native, true);

        let mut check = single(geolocation_requests(effects));
        let effects = resolve(
            &app,
            &mut model,
            &mut check,
            permission(PermissionStatus::NotDetermined),
        );
        let mut prompt = single(geolocation_requests(effects));
        assert_eq!(prompt.operation, GeolocationOperation::RequestPermission);

        let effects = resolve(
            &app,
            &mut model,
            &mut prompt,
            permission(PermissionStatus::Granted),
        );
        let mut locate = single(geolocation_requests(effects));
        assert_matches!(&locate.operation, GeolocationOperation::GetCurrentPosition { .. });
        assert_eq!(model.session().location(), &LocationState::Pending);

        let effects = resolve(&app, &mut model, &mut locate, position(12.97, 77.59));
        assert!(has_render(&effects));

        let view = view(&model);
        assert_matches!(
            view.location,
            LocationView::Resolved { text, map_url: Some(url), .. } => {
                assert_eq!(text, "12.97, 77.59");
                assert!(url.ends_with("?q=12.97,77.59"));
            }
        );
    }

    #[test]
    fn test_denial_then_retry_goes_pending() {
        let (app, mut model, effects) = entered(Platform::Native, true);

        let mut check = single(geolocation_requests(effects));
        let effects = resolve(
            &app,
            &mut model,
            &mut check,
            permission(PermissionStatus::NotDetermined),
        );
        let mut prompt = single(geolocation_requests(effects));
        let effects = resolve(
            &app,
            &mut model,
            &mut prompt,
            permission(PermissionStatus::Denied),
        );

        assert!(geolocation_requests(effects).is_empty());
        assert_eq!(
            model.session().location(),
            &LocationState::Denied { needs_settings: false }
        );
        assert_eq!(
            model.active_error().map(|e| e.kind),
            Some(ErrorKind::LocationPermissionDenied)
        );

        let effects = app.update(Event::LocationRequested, &mut model).effects;
        assert_eq!(model.session().location(), &LocationState::Pending);
        assert_eq!(
            single(geolocation_requests(effects)).operation,
            GeolocationOperation::CheckPermission
        );
    }

    #[test]
    fn test_permanent_denial_skips_prompt() {
        let (app, mut model, effects) = entered(Platform::Native, true);

        let mut check = single(geolocation_requests(effects));
        let effects = resolve(
            &app,
            &mut model,
            &mut check,
            permission(PermissionStatus::DeniedPermanently),
        );

        assert!(geolocation_requests(effects).is_empty());
        assert_eq!(
            model.session().location(),
            &LocationState::Denied { needs_settings: true }
        );
        assert_matches!(
            view(&model).location,
            LocationView::Denied { needs_settings: true, .. }
        );
    }

    #[test]
    fn test_browser_refusal_maps_to_denied() {
        let (app, mut model, effects) = entered(Platform::Web, true);

        let mut locate = single(geolocation_requests(effects));
        resolve(
            &app,
            &mut model,
            &mut locate,
            Err(GeolocationError::PermissionDenied),
        );

        assert_eq!(
            model.session().location(),
            &LocationState::Denied { needs_settings: false }
        );
    }

    #[test]
    fn test_timeout_is_failed_not_denied() {
        let (app, mut model, effects) = entered(Platform::Web, true);

        let mut locate = single(geolocation_requests(effects));
        resolve(
            &app,
            &mut model,
            &mut locate,
            Err(GeolocationError::Timeout { timeout_ms: 30_000 }),
        );

        assert_matches!(model.session().location(), LocationState::Failed(_));
        let notice = view(&model).notice.expect("failure notice");
        assert_eq!(notice.error_code, "LOCATION_ACQUISITION_FAILED");
        assert!(notice.message.contains("timed out"));
        assert!(notice.is_retryable);
    }

    #[test]
    fn test_missing_capability_is_failed() {
        let (app, mut model, effects) = entered(Platform::Native, true);

        let mut check = single(geolocation_requests(effects));
        resolve(
            &app,
            &mut model,
            &mut check,
            Err(GeolocationError::Unavailable {
                reason: "no location provider".into(),
            }),
        );

        assert_matches!(model.session().location(), LocationState::Failed(reason) if reason.contains("no location provider"));
    }

    #[test]
    fn test_out_of_range_position_is_failed() {
        let (app, mut model, effects) = entered(Platform::Web, true);

        let mut locate = single(geolocation_requests(effects));
        resolve(&app, &mut model, &mut locate, position(123.0, 10.0));

        assert_matches!(model.session().location(), LocationState::Failed(_));
    }

    #[test]
    fn test_resolution_clears_earlier_location_notice() {
        let (app, mut model, effects) = entered(Platform::Web, true);
        let mut locate = single(geolocation_requests(effects));
        resolve(
            &app,
            &mut model,
            &mut locate,
            Err(GeolocationError::PositionFailed {
                message: "no fix".into(),
            }),
        );
        assert!(model.active_error().is_some());

        let effects = app.update(Event::LocationRequested, &mut model).effects;
        let mut locate = single(geolocation_requests(effects));
        resolve(&app, &mut model, &mut locate, position(1.0, 2.0));

        assert!(model.active_error().is_none());
    }
}

mod file {
    use super::*;

    #[test]
    fn test_pick_then_remove_is_idempotent() {
        let (app, mut model, _) = entered(Platform::Native, false);

        let effects = pick(&app, &mut model, Ok(native_report("report.pdf")));
        assert!(has_render(&effects));
        let file = model.session().selected_file().expect("file selected");
        assert_eq!(file.display_name(), "report.pdf");
        assert_eq!(file.mime_type(), Some("application/pdf"));

        app.update(Event::FileRemoved, &mut model);
        let once = model.session().clone();
        app.update(Event::FileRemoved, &mut model);

        assert_eq!(model.session(), &once);
        assert!(model.session().selected_file().is_none());
    }

    #[test]
    fn test_pick_request_carries_config() {
        let (app, mut model, _) = entered(Platform::Native, false);

        let effects = app.update(Event::FileRequested, &mut model).effects;
        let request = single(file_picker_requests(effects));

        assert_matches!(
            &request.operation,
            FilePickerOperation::PickDocument { config } => {
                assert_eq!(config.mime_types, vec!["*/*".to_string()]);
                assert!(config.copy_to_cache);
                assert!(!config.allow_multiple);
            }
        );
    }

    #[test]
    fn test_browser_file_normalizes() {
        let (app, mut model, _) = entered(Platform::Web, false);

        pick(
            &app,
            &mut model,
            Ok(FilePickerOutput::Browser(BrowserFile {
                object_url: "blob:https://app.example/3f2a".into(),
                file_name: "soil-2024.csv".into(),
                content_type: String::new(),
                size_bytes: Some(512),
            })),
        );

        let file = model.session().selected_file().expect("file selected");
        assert_eq!(file.display_name(), "soil-2024.csv");
        assert_eq!(file.mime_type(), None);
    }

    #[test]
    fn test_cancel_is_silent() {
        for cancelled in [
            Ok(FilePickerOutput::Cancelled),
            Err(FilePickerError::Cancelled),
        ] {
            let (app, mut model, _) = entered(Platform::Native, false);
            pick(&app, &mut model, Ok(native_report("first.pdf")));
            let before = model.session().clone();

            let effects = pick(&app, &mut model, cancelled);

            assert!(effects.is_empty());
            assert_eq!(model.session(), &before);
            assert!(model.active_error().is_none());
        }
    }

    #[test]
    fn test_failure_raises_notice_and_keeps_previous_file() {
        let (app, mut model, _) = entered(Platform::Native, false);
        pick(&app, &mut model, Ok(native_report("first.pdf")));

        pick(
            &app,
            &mut model,
            Err(FilePickerError::Unavailable {
                reason: "no document provider".into(),
            }),
        );

        assert_eq!(
            model.session().selected_file().map(|f| f.display_name()),
            Some("first.pdf")
        );
        let notice = view(&model).notice.expect("notice");
        assert_eq!(notice.error_code, "FILE_ACQUISITION_FAILED");
        assert!(notice.message.contains("no document provider"));
    }

    #[test]
    fn test_open_without_file_raises_notice() {
        let (app, mut model, _) = entered(Platform::Native, false);

        let effects = app.update(Event::OpenFileRequested, &mut model).effects;

        assert!(opener_requests(effects).is_empty());
        let notice = view(&model).notice.expect("notice");
        assert_eq!(notice.error_code, "FILE_OPEN_UNAVAILABLE");
        assert_eq!(notice.message, NO_FILE_NOTICE);
    }

    #[test]
    fn test_open_hands_document_to_opener() {
        let (app, mut model, _) = entered(Platform::Native, false);
        pick(&app, &mut model, Ok(native_report("report.pdf")));

        let effects = app.update(Event::OpenFileRequested, &mut model).effects;
        let mut request = single(opener_requests(effects));
        assert_eq!(
            request.operation,
            OpenerOperation::Open {
                target: OpenTarget::Document {
                    uri: "file:///data/user/0/cache/report.pdf".into(),
                    mime_type: Some("application/pdf".into()),
                }
            }
        );

        let effects = resolve(&app, &mut model, &mut request, Ok(OpenerOutput::Opened));
        assert!(effects.is_empty());
        assert!(model.active_error().is_none());
    }

    #[test]
    fn test_open_failure_surfaces_notice() {
        let (app, mut model, _) = entered(Platform::Native, false);
        pick(&app, &mut model, Ok(native_report("report.pdf")));

        let effects = app.update(Event::OpenFileRequested, &mut model).effects;
        let mut request = single(opener_requests(effects));
        resolve(&app, &mut model, &mut request, Err(OpenerError::NoHandler));

        assert_eq!(
            model.active_error().map(|e| e.kind),
            Some(ErrorKind::FileOpenUnavailable)
        );
    }
}

mod crop_and_review {
    use super::*;

    #[test]
    fn test_valid_crop_is_selected() {
        let (app, mut model, _) = entered(Platform::Native, false);

        app.update(
            Event::CropSelected {
                value: "Oil seeds".into(),
            },
            &mut model,
        );

        assert_eq!(model.session().crop_type(), Some(CropType::OilSeeds));
        assert_eq!(view(&model).crop.selected.as_deref(), Some("Oil seeds"));
    }

    #[test]
    fn test_invalid_crop_is_rejected_silently() {
        let (app, mut model, _) = entered(Platform::Native, false);
        app.update(
            Event::CropSelected {
                value: "Paddy".into(),
            },
            &mut model,
        );

        let effects = app
            .update(
                Event::CropSelected {
                    value: "InvalidCrop".into(),
                },
                &mut model,
            )
            .effects;

        assert!(effects.is_empty());
        assert_eq!(model.session().crop_type(), Some(CropType::Paddy));
        assert!(model.active_error().is_none());
    }

    #[test]
    fn test_crop_survives_file_and_location_outcomes() {
        let (app, mut model, _) = entered(Platform::Native, false);
        app.update(
            Event::CropSelected {
                value: "Pulses".into(),
            },
            &mut model,
        );
        let crop = Some(CropType::Pulses);

        pick(&app, &mut model, Ok(native_report("report.pdf")));
        assert_eq!(model.session().crop_type(), crop);

        pick(&app, &mut model, Ok(FilePickerOutput::Cancelled));
        assert_eq!(model.session().crop_type(), crop);

        pick(&app, &mut model, Err(FilePickerError::Busy));
        assert_eq!(model.session().crop_type(), crop);

        app.update(Event::FileRemoved, &mut model);
        assert_eq!(model.session().crop_type(), crop);

        let effects = app.update(Event::LocationRequested, &mut model).effects;
        let mut check = single(geolocation_requests(effects));
        resolve(
            &app,
            &mut model,
            &mut check,
            permission(PermissionStatus::DeniedPermanently),
        );
        assert_matches!(model.session().location(), LocationState::Denied { .. });
        assert_eq!(model.session().crop_type(), crop);

        let effects = app.update(Event::LocationRequested, &mut model).effects;
        let mut check = single(geolocation_requests(effects));
        let effects = resolve(
            &app,
            &mut model,
            &mut check,
            permission(PermissionStatus::Granted),
        );
        let mut locate = single(geolocation_requests(effects));
        resolve(
            &app,
            &mut model,
            &mut locate,
            Err(GeolocationError::Timeout { timeout_ms: 30_000 }),
        );
        assert_matches!(model.session().location(), LocationState::Failed(_));
        assert_eq!(model.session().crop_type(), crop);

        let effects = app.update(Event::LocationRequested, &mut model).effects;
        let mut superseded = single(geolocation_requests(effects));
        app.update(Event::LocationRequested, &mut model);
        resolve(
            &app,
            &mut model,
            &mut superseded,
            permission(PermissionStatus::Granted),
        );
        assert_eq!(model.session().location(), &LocationState::Pending);
        assert_eq!(model.session().crop_type(), crop);
    }

    #[test]
    fn test_review_toggle_shows_absence_notices() {
        let (app, mut model, _) = entered(Platform::Native, false);

        app.update(Event::ReviewShown, &mut model);
        let review = view(&model).review.expect("review visible");
        assert_eq!(review.file_line, NO_FILE_NOTICE);
        assert_eq!(review.crop_line, NO_CROP_NOTICE);

        app.update(Event::ReviewHidden, &mut model);
        assert!(view(&model).review.is_none());
        assert!(view(&model).is_reviewable);
    }

    #[test]
    fn test_complete_session_on_web_links_map_in_review() {
        let (app, mut model, effects) = entered(Platform::Web, true);
        let mut locate = single(geolocation_requests(effects));
        resolve(&app, &mut model, &mut locate, position(-1.25, 36.5));
        pick(&app, &mut model, Ok(native_report("report.pdf")));
        app.update(
            Event::CropSelected {
                value: "Ground Nuts".into(),
            },
            &mut model,
        );
        app.update(Event::ReviewShown, &mut model);

        let view = view(&model);
        assert!(view.is_complete);
        let review = view.review.expect("review visible");
        assert_eq!(review.crop_line, "Ground Nuts");
        assert_eq!(review.location_line, "-1.25, 36.5");
        assert_eq!(
            review.map_url.as_deref(),
            Some("https://www.google.com/maps?q=-1.25,36.5")
        );
    }

    #[test]
    fn test_reset_clears_everything_without_locating() {
        let (app, mut model, effects) = entered(Platform::Web, true);
        let mut locate = single(geolocation_requests(effects));
        resolve(&app, &mut model, &mut locate, position(10.0, 20.0));
        pick(&app, &mut model, Ok(native_report("report.pdf")));
        app.update(
            Event::CropSelected {
                value: "Maize".into(),
            },
            &mut model,
        );
        app.update(Event::ReviewShown, &mut model);
        let session_id = model.session_id();

        let effects = app.update(Event::ResetRequested, &mut model).effects;

        assert!(geolocation_requests(effects).is_empty());
        let session = model.session();
        assert!(session.selected_file().is_none());
        assert_eq!(session.crop_type(), None);
        assert_eq!(session.location(), &LocationState::Unresolved);
        assert!(!session.review_visible());
        assert_eq!(model.session_id(), session_id);
    }

    #[test]
    fn test_notice_dismissed() {
        let (app, mut model, _) = entered(Platform::Native, false);
        app.update(Event::OpenFileRequested, &mut model);
        assert!(model.active_error().is_some());

        app.update(Event::NoticeDismissed, &mut model);
        assert!(view(&model).notice.is_none());
    }
}

mod map {
    use super::*;

    #[test]
    fn test_map_without_location_raises_notice() {
        let (app, mut model, _) = entered(Platform::Native, false);

        let effects = app.update(Event::OpenMapRequested, &mut model).effects;

        assert!(opener_requests(effects).is_empty());
        assert_eq!(
            model.active_error().map(|e| e.kind),
            Some(ErrorKind::MapUnavailable)
        );
    }

    #[test]
    fn test_map_opens_search_link() {
        let (app, mut model, effects) = entered(Platform::Native, true);
        let mut check = single(geolocation_requests(effects));
        let effects = resolve(
            &app,
            &mut model,
            &mut check,
            permission(PermissionStatus::Granted),
        );
        let mut locate = single(geolocation_requests(effects));
        resolve(&app, &mut model, &mut locate, position(48.8566, 2.3522));

        let effects = app.update(Event::OpenMapRequested, &mut model).effects;
        let mut request = single(opener_requests(effects));
        assert_eq!(
            request.operation,
            OpenerOperation::Open {
                target: OpenTarget::Url {
                    url: "https://www.google.com/maps?q=48.8566,2.3522".into()
                }
            }
        );

        resolve(&app, &mut model, &mut request, Err(OpenerError::Unsupported));
        assert_eq!(
            model.active_error().map(|e| e.kind),
            Some(ErrorKind::MapUnavailable)
        );
    }
}
