//! A simulated client whose modules and events the inspector attaches to

use inspector_ui::hooks::{HostError, HostModules, LocalEventBus, ModuleHandle, ModuleRegistry, SharedModules};
use inspector_ui::viewer::{ObjectRef, Value};
use std::sync::Arc;

pub struct SimulatedHost {
    registry: ModuleRegistry,
    pub bus: LocalEventBus,
    chat: ObjectRef,
    tick: u64,
}

impl SimulatedHost {
    pub fn new() -> Self {
        let registry = ModuleRegistry::new();
        registry
            .register(
                ModuleHandle::new("wap")
                    .with_export("encode_stanza", |args| {
                        let size = args.first().map(|a| a.to_json().to_string().len()).unwrap_or(0);
                        Ok(Value::object([("bytes", Value::from(size as i64))]))
                    })
                    .with_export("decode_stanza", |args| match args.first() {
                        Some(Value::String(frame)) if frame.is_empty() => Err(HostError::new("empty frame")),
                        Some(Value::String(frame)) => Ok(Value::object([
                            ("tag", Value::from("message")),
                            ("attrs", Value::object([("from", Value::from("5511999999999@c.us"))])),
                            ("content", Value::from(frame.as_str())),
                        ])),
                        _ => Ok(Value::Null),
                    }),
            )
            .register(ModuleHandle::new("protobuf").with_export("decode_protobuf", |args| {
                let bytes = args.get(1).cloned().unwrap_or(Value::Undefined);
                Ok(Value::object([("spec", args.first().cloned().unwrap_or(Value::Null)), ("raw", bytes)]))
            }))
            .register(ModuleHandle::new("logger").with_export("log", |_| Ok(Value::Undefined)))
            .register(
                ModuleHandle::new("sync_request_builder")
                    .with_export("build_sync_iq_node", |_| Ok(Value::from("<iq type='set'/>"))),
            )
            .register(
                ModuleHandle::new("send_msg_api").with_export("encode_and_pad", |args| {
                    Ok(Value::from(format!("padded:{}", args.len())))
                }),
            );

        Self {
            registry,
            bus: LocalEventBus::new(),
            chat: build_chat(),
            tick: 0,
        }
    }

    pub fn modules(&self) -> SharedModules {
        Arc::new(self.registry.clone())
    }

    fn call(&self, module: &str, export: &str, args: &[Value]) {
        let Some(handle) = self.registry.require(module) else {
            return;
        };
        if let Err(e) = handle.call(export, args) {
            tracing::warn!(target: "host", module, export, error = %e, "host call failed");
        }
    }

    /// One round of simulated client traffic
    pub fn step(&mut self) {
        self.tick += 1;
        let tick = self.tick as i64;

        if self.tick == 1 {
            self.bus.emit("conn.main_ready", Value::Bool(true));
        }

        self.call(
            "wap",
            "encode_stanza",
            &[Value::from(serde_json::json!({
                "tag": "iq",
                "attrs": { "id": format!("{}.{}", tick, tick * 7), "type": "get", "xmlns": "w:p" },
                "content": [{ "tag": "ping" }]
            }))],
        );

        let frame = if self.tick % 5 == 0 { String::new() } else { format!("frame-{}", tick) };
        self.call("wap", "decode_stanza", &[Value::from(frame)]);
        self.call(
            "protobuf",
            "decode_protobuf",
            &[Value::from("Message"), Value::array([Value::from(10i64), Value::from(tick)])],
        );
        self.call("logger", "log", &[Value::from("[socket] heartbeat"), Value::from(tick)]);

        if self.tick % 2 == 0 {
            let mutation = Value::object([
                ("index", Value::from(format!("[\"archive\",\"{}@c.us\"]", tick))),
                ("version", Value::from(2i64)),
                ("operation", Value::from("SET")),
            ]);
            self.call("sync_request_builder", "build_sync_iq_node", &[Value::array([mutation])]);
            self.call("send_msg_api", "encode_and_pad", &[Value::Object(self.chat.clone())]);
        }

        if self.tick % 3 == 0 {
            self.chat.set("unreadCount", Value::from(tick));
            self.bus.emit("chat.active_chat", Value::Object(self.chat.clone()));
        }

        tracing::info!(target: "host::received", tick, "socket frame processed");
    }
}

/// A chat model with the awkward parts real host objects have: a cycle
/// through its collection, a failing getter, a method and a long body.
fn build_chat() -> ObjectRef {
    let base = ObjectRef::with_constructor("BaseModel");
    base.set(
        "serialize",
        Value::function(None, "function serialize(options) { return this.toJSON(options) }"),
    );

    let chat = ObjectRef::with_constructor("Chat");
    chat.set_prototype(Some(base));
    chat.set("id", Value::from("5511999999999@c.us"));
    chat.set("name", Value::from("Family"));
    chat.set("unreadCount", Value::from(0i64));
    chat.set("lastMessage", Value::from("lorem ipsum ".repeat(15)));
    chat.set(
        "sendMessage",
        Value::function(Some("sendMessage"), "async function sendMessage(text, options) { /* ... */ }"),
    );
    chat.define_accessor("presence", || Err("permission denied".to_string()));
    chat.set("__x_internal", Value::Null);

    let collection = ObjectRef::with_constructor("ChatCollection");
    collection.set("models", Value::array([Value::Object(chat.clone())]));
    chat.set("collection", Value::Object(collection));
    chat
}
