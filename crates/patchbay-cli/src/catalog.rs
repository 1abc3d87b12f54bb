//! Built-in node types available to the CLI.

use patchbay_core::{
    Dimensions, InputPort, NodeTypeDef, ParamRef, PortDef, PortSet, RuntimeUnit, SignalInput,
    SignalOutput, TypeCatalog,
};
use serde_json::{Map, Value, json};

/// Port kind carried by every demo port.
const AUDIO: &str = "audio";

/// Short descriptions shown by `patchbay types`.
pub const DESCRIPTIONS: &[(&str, &str)] = &[
    ("gain", "Scales its input; the gain parameter accepts modulation"),
    ("oscillator", "Periodic signal generator"),
    ("processor", "User code compiled into a host processor"),
    ("speaker", "Sends its input to the output device"),
];

/// Returns the description for `name`, if one exists.
pub fn description(name: &str) -> Option<&'static str> {
    DESCRIPTIONS
        .iter()
        .find(|(type_name, _)| *type_name == name)
        .map(|(_, text)| *text)
}

fn ports(inputs: &[&str], outputs: &[&str]) -> PortSet {
    PortSet::new(
        inputs.iter().map(|name| PortDef::new(*name, AUDIO)).collect(),
        outputs.iter().map(|name| PortDef::new(*name, AUDIO)).collect(),
    )
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Builds the demo catalog.
pub fn demo_catalog() -> TypeCatalog {
    let mut catalog = TypeCatalog::new();

    catalog.register_type(
        "oscillator",
        NodeTypeDef::new(
            ports(&["frequency"], &["out"]),
            Dimensions::new(100.0, 60.0),
            |ctx| {
                let frequency = ctx.number("frequency", 440.0)?;
                let node = ctx
                    .host()
                    .create_node("oscillator", &[("frequency", frequency)])?;
                ctx.host().start(node)?;
                let param = ParamRef::new(node, "frequency");
                let hook_param = param.clone();
                Ok(RuntimeUnit::new()
                    .with_input("frequency", InputPort::Parameter(param))
                    .with_output("out", SignalOutput::new(node, 0))
                    .owning(node)
                    .on_state_change(move |state, key, host| {
                        if key == "frequency"
                            && let Some(value) = state.get_f64("frequency")
                        {
                            host.set_param_value(&hook_param, value as f32)?;
                        }
                        Ok(())
                    })
                    .describe_with(|state| {
                        format!("{} Hz", state.get_f64("frequency").unwrap_or(440.0))
                    }))
            },
        )
        .with_default_state(object(json!({"frequency": 440.0}))),
    );

    catalog.register_type(
        "gain",
        NodeTypeDef::new(
            ports(&["in", "gain"], &["out"]),
            Dimensions::new(100.0, 60.0),
            |ctx| {
                let gain = ctx.number("gain", 0.8)?;
                let node = ctx.host().create_node("gain", &[("gain", gain)])?;
                let param = ParamRef::new(node, "gain");
                let hook_param = param.clone();
                Ok(RuntimeUnit::new()
                    .with_input("in", InputPort::Signal(SignalInput::new(node, 0)))
                    .with_input("gain", InputPort::Parameter(param))
                    .with_output("out", SignalOutput::new(node, 0))
                    .owning(node)
                    .on_state_change(move |state, key, host| {
                        if key == "gain"
                            && let Some(value) = state.get_f64("gain")
                        {
                            host.set_param_value(&hook_param, value as f32)?;
                        }
                        Ok(())
                    })
                    .describe_with(|state| format!("x{:.2}", state.get_f64("gain").unwrap_or(0.8))))
            },
        )
        .with_default_state(object(json!({"gain": 0.8}))),
    );

    catalog.register_type(
        "speaker",
        NodeTypeDef::new(ports(&["in"], &[]), Dimensions::new(80.0, 60.0), |ctx| {
            let node = ctx.host().create_node("destination", &[])?;
            Ok(RuntimeUnit::new()
                .with_input("in", InputPort::Signal(SignalInput::new(node, 0)))
                .owning(node))
        }),
    );

    catalog.register_type(
        "processor",
        NodeTypeDef::new(
            ports(&["in"], &["out"]),
            Dimensions::new(120.0, 60.0),
            |ctx| {
                let identity = ctx.registration()?;
                let node = ctx.host().create_processor(identity, &[])?;
                let label = identity.to_string();
                Ok(RuntimeUnit::new()
                    .with_input("in", InputPort::Signal(SignalInput::new(node, 0)))
                    .with_output("out", SignalOutput::new(node, 0))
                    .owning(node)
                    .describe_with(move |_| label.clone()))
            },
        )
        .with_default_state(object(json!({"code": "process(input) { return input; }"}))),
    );

    catalog
}
