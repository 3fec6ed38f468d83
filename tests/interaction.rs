use choropleth::interaction::{ClickHandler, TooltipRenderer};
use choropleth::{
    Binder, BoundFeature, Choropleth, ChoroplethOptions, DataRecord, Feature, Geometry,
    InteractionRouter, PointerEvent, TooltipContent, TooltipService,
};
use std::cell::RefCell;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingTooltip {
    calls: RefCell<Vec<String>>,
}

impl TooltipService for RecordingTooltip {
    fn show(&self, content: TooltipContent, event: &PointerEvent) {
        self.calls
            .borrow_mut()
            .push(format!("show {} @{},{}", content.text(), event.x, event.y));
    }

    fn hide(&self) {
        self.calls.borrow_mut().push("hide".to_string());
    }
}

fn bound() -> Vec<BoundFeature> {
    let features = vec![
        Feature::new("DEU", Geometry::Polygon(vec![])).with_property("name", "Germany"),
        Feature::new("FRA", Geometry::Polygon(vec![])),
    ];
    let records = vec![DataRecord::new().with("id", "DEU").with("value", 83)];
    Binder::default().bind(&features, &records).unwrap().features
}

#[test]
fn disabled_router_makes_no_external_calls() {
    let tooltip = RecordingTooltip::default();
    let clicks = Arc::new(Mutex::new(0));
    let counter = clicks.clone();
    let handler: ClickHandler = Arc::new(move |_: &BoundFeature, _: &PointerEvent| {
        *counter.lock().unwrap() += 1;
    });
    let router = InteractionRouter::new(false)
        .with_tooltip(&tooltip)
        .with_click(Some(&handler));

    let features = bound();
    let ev = PointerEvent::at(5.0, 5.0);
    router.on_enter(&features[0], &ev);
    router.on_move(&features[0], &ev);
    router.on_leave();
    router.on_click(&features[0], &ev);

    assert!(tooltip.calls.borrow().is_empty());
    assert_eq!(*clicks.lock().unwrap(), 0);
}

#[test]
fn enabled_router_shows_moves_and_hides() {
    let tooltip = RecordingTooltip::default();
    let router = InteractionRouter::new(true).with_tooltip(&tooltip);
    let features = bound();

    router.on_enter(&features[0], &PointerEvent::at(1.0, 2.0));
    router.on_move(&features[1], &PointerEvent::at(3.0, 4.0));
    router.on_leave();

    assert_eq!(
        *tooltip.calls.borrow(),
        vec![
            "show DEU: 83 @1,2".to_string(),
            "show FRA @3,4".to_string(),
            "hide".to_string(),
        ]
    );
}

#[test]
fn missing_callbacks_are_silent() {
    let router = InteractionRouter::new(true);
    let features = bound();
    let ev = PointerEvent::default();
    router.on_enter(&features[0], &ev);
    router.on_click(&features[0], &ev);
    router.on_leave();
}

#[test]
fn click_receives_feature_and_event() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler: ClickHandler = Arc::new(move |f: &BoundFeature, ev: &PointerEvent| {
        sink.lock().unwrap().push((f.feature.id_string(), ev.x));
    });
    let router = InteractionRouter::new(true).with_click(Some(&handler));
    let features = bound();
    router.on_click(&features[1], &PointerEvent::at(7.0, 0.0));
    router.on_click(&features[1], &PointerEvent::at(7.0, 0.0));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![("FRA".to_string(), 7.0), ("FRA".to_string(), 7.0)]
    );
}

#[test]
fn tooltip_renderer_overrides_content() {
    let tooltip = RecordingTooltip::default();
    let renderer: TooltipRenderer = Arc::new(|f: &BoundFeature| TooltipContent {
        label: format!("<{}>", f.label),
        formatted_value: None,
        color: f.color,
    });
    let router = InteractionRouter::new(true)
        .with_tooltip(&tooltip)
        .with_renderer(Some(&renderer));
    router.on_enter(&bound()[0], &PointerEvent::at(0.0, 0.0));
    assert_eq!(*tooltip.calls.borrow(), vec!["show <DEU> @0,0".to_string()]);
}

#[test]
fn choropleth_router_respects_is_interactive() {
    let options = ChoroplethOptions {
        is_interactive: Some(false),
        ..Default::default()
    };
    let map = Choropleth::from_options(&options)
        .unwrap()
        .with_on_click(|_, _| panic!("click must not fire"));
    let tooltip = RecordingTooltip::default();
    let router = map.router(&tooltip);
    assert!(!router.is_interactive());
    let features = bound();
    router.on_enter(&features[0], &PointerEvent::default());
    router.on_click(&features[0], &PointerEvent::default());
    assert!(tooltip.calls.borrow().is_empty());
}

#[test]
fn pointer_hit_test_feeds_the_router() {
    // Two adjacent squares around the projection center.
    let square = |id: &str, x0: f64| {
        Feature::new(
            id,
            Geometry::Polygon(vec![vec![
                [x0, -10.0],
                [x0 + 20.0, -10.0],
                [x0 + 20.0, 10.0],
                [x0, 10.0],
                [x0, -10.0],
            ]]),
        )
    };
    let features = vec![square("W", -20.0), square("E", 0.0)];
    let records = vec![DataRecord::new().with("id", "E").with("value", 1)];
    let map = Choropleth::from_options(&ChoroplethOptions::default()).unwrap();
    let rendered = map.render(&features, &records).unwrap();

    // Default canvas 800x500, projection centered at (400, 250).
    let east = rendered.feature_at(&PointerEvent::at(410.0, 250.0)).unwrap();
    assert_eq!(east.feature.id_string(), "E");
    let west = rendered.feature_at(&PointerEvent::at(390.0, 250.0)).unwrap();
    assert_eq!(west.feature.id_string(), "W");
    assert!(rendered.feature_at(&PointerEvent::at(5.0, 5.0)).is_none());

    let tooltip = RecordingTooltip::default();
    map.router(&tooltip).on_enter(east, &PointerEvent::at(410.0, 250.0));
    assert_eq!(tooltip.calls.borrow().len(), 1);
}
