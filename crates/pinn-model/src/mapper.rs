// Pinnacle IO - Treatment planning record codec
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Schema mapper: generic tree to typed entities and back.
//!
//! Each entity type implements [`Entity`] by pulling its fields through a
//! [`FieldReader`] and pushing them into a [`FieldWriter`]. The reader takes
//! care of coercion, defaults, recursion into owned children and the
//! unknown-key side table; the writer emits fields in schema order and puts
//! the unknown keys back next to the known key they followed.

use pinn_core::lex::is_bareword_safe;
use pinn_core::{Block, Diagnostic, DiagnosticKind, Diagnostics, Document, Node, Scalar, SourcePos, Value};
use pinn_grid::GridDims;
use tracing::warn;

use crate::error::{SchemaError, SchemaResult};
use crate::meta::{EntityId, EntityMeta, Extras};
use crate::owned::{OwnedList, OwnedSlot};
use crate::reference::NamedRef;
use crate::schema::{DefaultValue, EntitySchema, FieldKind, FieldSpec, ItemKey};

/// A typed record with a declarative schema.
pub trait Entity: Sized {
    const TYPE_NAME: &'static str;

    fn schema() -> &'static EntitySchema;

    fn meta(&self) -> &EntityMeta;

    fn meta_mut(&mut self) -> &mut EntityMeta;

    /// Builds the entity from its block.
    fn read(reader: &mut FieldReader<'_>) -> SchemaResult<Self>;

    /// Emits the entity's known fields.
    fn write(&self, writer: &mut FieldWriter);
}

/// A point or extent in patient coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

fn join_path(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_owned()
    } else {
        format!("{}.{}", base, key)
    }
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Some(*f as i64)
        }
        Value::Text(s) | Value::Word(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Int(n) => *n as f64,
        Value::Float(f) => *f,
        Value::Text(s) | Value::Word(s) => s.trim().parse().ok()?,
        Value::Null => return None,
    };
    f.is_finite().then_some(f)
}

fn coerce_flag(value: &Value) -> Option<bool> {
    match coerce_int(value)? {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

fn coerce_text(scalar: &Scalar) -> Option<String> {
    match &scalar.value {
        Value::Text(s) | Value::Word(s) => Some(s.clone()),
        Value::Int(_) | Value::Float(_) => Some(
            scalar
                .raw
                .clone()
                .unwrap_or_else(|| scalar.value.to_string()),
        ),
        Value::Null => None,
    }
}

/// Reads the fields of one entity from its block.
pub struct FieldReader<'a> {
    schema: &'static EntitySchema,
    block: &'a Block,
    path: String,
    pos: Option<SourcePos>,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> FieldReader<'a> {
    pub fn new(
        schema: &'static EntitySchema,
        block: &'a Block,
        path: impl Into<String>,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            schema,
            block,
            path: path.into(),
            pos: None,
            diagnostics,
        }
    }

    /// Position of the statement that opened the block.
    pub fn at(mut self, pos: SourcePos) -> Self {
        self.pos = Some(pos);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn block(&self) -> &'a Block {
        self.block
    }

    /// Fresh metadata carrying the block's unknown keys.
    pub fn meta(&self) -> EntityMeta {
        let mut meta = EntityMeta::new();
        meta.pos = self.pos;
        let mut anchor: Option<&str> = None;
        for entry in self.block {
            if self.schema.is_known(&entry.key) {
                anchor = Some(entry.key.as_str());
            } else {
                meta.extras.push(entry.key.clone(), entry.node.clone(), anchor);
            }
        }
        meta
    }

    fn error(&self, key: &str, message: impl Into<String>) -> SchemaError {
        let err = SchemaError::new(self.schema.name, key, message).with_path(self.path.clone());
        match self.block.get_entry(key).map(|e| e.pos).or(self.pos) {
            Some(pos) => err.at(pos),
            None => err,
        }
    }

    fn missing(&self, key: &str) -> SchemaError {
        self.error(key, "missing required field")
    }

    fn mistyped(&self, key: &str, expected: &str, found: &Value) -> SchemaError {
        self.error(
            key,
            format!("expected {}, found {} '{}'", expected, found.type_name(), found),
        )
    }

    /// The declared spec of `key`, rejected when the accessor used does
    /// not read the declared kind.
    fn spec(&self, key: &str, accepts: fn(FieldKind) -> bool) -> SchemaResult<&'static FieldSpec> {
        let schema: &'static EntitySchema = self.schema;
        match schema.field(key) {
            Some(spec) if accepts(spec.kind) => Ok(spec),
            Some(spec) => Err(self.error(key, format!("declared as {}", spec.kind.name()))),
            None => Err(self.error(key, "not declared in the entity schema")),
        }
    }

    /// What an absent field reads as: its declared default, nothing, or a
    /// missing-field error when it is required.
    fn absent(&self, spec: &FieldSpec) -> SchemaResult<Option<DefaultValue>> {
        match spec.default {
            Some(default) => Ok(Some(default)),
            None if spec.required => Err(self.missing(spec.key)),
            None => Ok(None),
        }
    }

    /// Fails on the first required field without a default that the block
    /// does not carry, whether or not the entity reads it.
    fn check_required(&self) -> SchemaResult<()> {
        for spec in self.schema.required_fields() {
            if spec.default.is_some() {
                continue;
            }
            let present = match self.block.get(spec.key) {
                None => false,
                Some(Node::Scalar(s)) => !s.value.is_null(),
                Some(_) => true,
            };
            if !present {
                return Err(self.missing(spec.key));
            }
        }
        Ok(())
    }

    fn report(&mut self, err: SchemaError) {
        self.diagnostics.push(err.to_diagnostic());
    }

    /// The node under `key`, coerced to a single occurrence.
    fn node(&mut self, key: &str) -> Option<&'a Node> {
        let block = self.block;
        match block.get(key)? {
            Node::List(items) => {
                let err = self.error(
                    key,
                    format!("repeated {} times, keeping the first", items.len()),
                );
                self.report(err);
                items.first()
            }
            node => Some(node),
        }
    }

    fn scalar(&mut self, key: &str) -> SchemaResult<Option<&'a Scalar>> {
        match self.node(key) {
            None => Ok(None),
            Some(Node::Scalar(s)) if s.value.is_null() => Ok(None),
            Some(Node::Scalar(s)) => Ok(Some(s)),
            Some(other) => Err(self.error(
                key,
                format!("expected scalar, found {}", other.kind_name()),
            )),
        }
    }

    pub fn opt_int(&mut self, key: &str) -> SchemaResult<Option<i64>> {
        let spec = self.spec(key, |k| k == FieldKind::Int)?;
        match self.scalar(key)? {
            Some(s) => coerce_int(&s.value)
                .map(Some)
                .ok_or_else(|| self.mistyped(key, "integer", &s.value)),
            None => match self.absent(spec)? {
                Some(DefaultValue::Int(n)) => Ok(Some(n)),
                _ => Ok(None),
            },
        }
    }

    pub fn opt_float(&mut self, key: &str) -> SchemaResult<Option<f64>> {
        let spec = self.spec(key, |k| k == FieldKind::Float)?;
        match self.scalar(key)? {
            Some(s) => coerce_float(&s.value)
                .map(Some)
                .ok_or_else(|| self.mistyped(key, "number", &s.value)),
            None => match self.absent(spec)? {
                Some(DefaultValue::Float(f)) => Ok(Some(f)),
                Some(DefaultValue::Int(n)) => Ok(Some(n as f64)),
                _ => Ok(None),
            },
        }
    }

    pub fn opt_flag(&mut self, key: &str) -> SchemaResult<Option<bool>> {
        let spec = self.spec(key, |k| k == FieldKind::Flag)?;
        match self.scalar(key)? {
            Some(s) => coerce_flag(&s.value)
                .map(Some)
                .ok_or_else(|| self.mistyped(key, "0 or 1", &s.value)),
            None => match self.absent(spec)? {
                Some(DefaultValue::Flag(b)) => Ok(Some(b)),
                _ => Ok(None),
            },
        }
    }

    /// Text of a `Text` or `Word` field.
    pub fn opt_text(&mut self, key: &str) -> SchemaResult<Option<String>> {
        let spec = self.spec(key, |k| matches!(k, FieldKind::Text | FieldKind::Word))?;
        match self.scalar(key)?.and_then(coerce_text) {
            Some(text) => Ok(Some(text)),
            None => match self.absent(spec)? {
                Some(DefaultValue::Text(t)) => Ok(Some(t.to_owned())),
                _ => Ok(None),
            },
        }
    }

    /// A name reference. Versioned references key on the text before `:`.
    pub fn opt_ref(&mut self, key: &str) -> SchemaResult<Option<NamedRef>> {
        let spec = self.spec(key, |k| {
            matches!(k, FieldKind::Reference(_) | FieldKind::VersionedReference(_))
        })?;
        let Some(raw) = self.scalar(key)?.and_then(coerce_text) else {
            self.absent(spec)?;
            return Ok(None);
        };
        Ok(Some(match spec.kind {
            FieldKind::VersionedReference(_) => NamedRef::versioned(raw),
            _ => NamedRef::new(raw),
        }))
    }

    /// Reads a field declared required; absence is an error even when the
    /// accessor is used on an optional field.
    pub fn req_int(&mut self, key: &str) -> SchemaResult<i64> {
        self.opt_int(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn req_float(&mut self, key: &str) -> SchemaResult<f64> {
        self.opt_float(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn req_flag(&mut self, key: &str) -> SchemaResult<bool> {
        self.opt_flag(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn req_text(&mut self, key: &str) -> SchemaResult<String> {
        self.opt_text(key)?.ok_or_else(|| self.missing(key))
    }

    fn axes(&mut self, key: &str) -> SchemaResult<Option<[&'a Value; 3]>> {
        let Some(node) = self.node(key) else {
            return Ok(None);
        };
        let Some(block) = node.as_block() else {
            return Err(self.error(
                key,
                format!("expected block, found {}", node.kind_name()),
            ));
        };
        let mut out: [&'a Value; 3] = [&Value::Null; 3];
        for (slot, axis) in out.iter_mut().zip(["X", "Y", "Z"]) {
            match block.get(axis).and_then(Node::as_scalar) {
                Some(s) => *slot = &s.value,
                None => return Err(self.error(key, format!("missing component {}", axis))),
            }
        }
        Ok(Some(out))
    }

    pub fn opt_vec3(&mut self, key: &str) -> SchemaResult<Option<Vec3>> {
        let spec = self.spec(key, |k| k == FieldKind::Vec3)?;
        let Some(axes) = self.axes(key)? else {
            return match self.absent(spec)? {
                Some(DefaultValue::Vec3(x, y, z)) => Ok(Some(Vec3::new(x, y, z))),
                _ => Ok(None),
            };
        };
        let mut out = [0.0; 3];
        for (slot, value) in out.iter_mut().zip(axes) {
            *slot = coerce_float(value).ok_or_else(|| self.mistyped(key, "number", value))?;
        }
        Ok(Some(Vec3::new(out[0], out[1], out[2])))
    }

    pub fn req_vec3(&mut self, key: &str) -> SchemaResult<Vec3> {
        self.opt_vec3(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn opt_dims(&mut self, key: &str) -> SchemaResult<Option<GridDims>> {
        let spec = self.spec(key, |k| k == FieldKind::Dims)?;
        let Some(axes) = self.axes(key)? else {
            self.absent(spec)?;
            return Ok(None);
        };
        let mut out = [0usize; 3];
        for (slot, value) in out.iter_mut().zip(axes) {
            *slot = coerce_int(value)
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| self.mistyped(key, "non-negative integer", value))?;
        }
        Ok(Some(GridDims::new(out[0], out[1], out[2])))
    }

    pub fn req_dims(&mut self, key: &str) -> SchemaResult<GridDims> {
        self.opt_dims(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn opt_float_array(&mut self, key: &str) -> SchemaResult<Option<Vec<f64>>> {
        let spec = self.spec(key, |k| k == FieldKind::FloatArray)?;
        let Some(node) = self.node(key) else {
            self.absent(spec)?;
            return Ok(None);
        };
        let values = match node {
            Node::Array(values) => values,
            // `Points[] ={ };` has no number to recognise it by
            Node::Block(b) if b.is_empty() => return Ok(Some(Vec::new())),
            other => {
                return Err(self.error(
                    key,
                    format!("expected array, found {}", other.kind_name()),
                ))
            }
        };
        values
            .iter()
            .map(|s| coerce_float(&s.value).ok_or_else(|| self.mistyped(key, "number", &s.value)))
            .collect::<SchemaResult<Vec<_>>>()
            .map(Some)
    }

    fn map_child<T: Entity>(&mut self, block: &Block, path: String, pos: Option<SourcePos>) -> Option<T> {
        let mut reader = FieldReader {
            schema: T::schema(),
            block,
            path,
            pos,
            diagnostics: &mut *self.diagnostics,
        };
        match read_checked::<T>(&mut reader) {
            Ok(child) => Some(child),
            Err(err) => {
                warn!(entity = T::TYPE_NAME, path = %err.path, "dropping entity: {}", err);
                self.report(err);
                None
            }
        }
    }

    /// Maps an owned singleton declared as `Child(T)`. A child that fails
    /// its own schema is reported and left out.
    pub fn child<T: Entity>(&mut self, key: &str, owner: EntityId) -> OwnedSlot<T> {
        let mut slot = OwnedSlot::new(owner);
        if let Err(err) = self.spec(key, |k| matches!(k, FieldKind::Child(_))) {
            self.report(err);
            return slot;
        }
        let pos = self.block.get_entry(key).map(|e| e.pos);
        match self.node(key) {
            None => {}
            Some(Node::Block(block)) => {
                let path = join_path(&self.path, key);
                if let Some(child) = self.map_child::<T>(block, path, pos) {
                    slot.set(child);
                }
            }
            Some(other) => {
                let err = self.error(key, format!("expected block, found {}", other.kind_name()));
                self.report(err);
            }
        }
        slot
    }

    /// Maps an owned list held in the container block under `key`, keyed
    /// as its `ChildList` declaration says.
    ///
    /// A single item is accepted as a one-element list. Statements in the
    /// container that are not items are kept in the list's extras.
    pub fn children<T: Entity>(&mut self, key: &str, owner: EntityId) -> OwnedList<T> {
        let mut list = OwnedList::new(owner);
        let item = match self.spec(key, |k| matches!(k, FieldKind::ChildList { .. })) {
            Ok(FieldSpec {
                kind: FieldKind::ChildList { item, .. },
                ..
            }) => *item,
            Ok(_) => return list,
            Err(err) => {
                self.report(err);
                return list;
            }
        };
        let block = self.block;
        let Some(node) = block.get(key) else {
            return list;
        };
        let base = join_path(&self.path, key);
        let mut index = 0;
        for container in node.items() {
            let Node::Block(container) = container else {
                let err = self.error(key, format!("expected block, found {}", container.kind_name()));
                self.report(err);
                continue;
            };
            let mut anchor: Option<&str> = None;
            for entry in container {
                if !item.matches(&entry.key) {
                    list.extras.push(entry.key.clone(), entry.node.clone(), anchor);
                    continue;
                }
                anchor = Some(entry.key.as_str());
                for node in entry.node.items() {
                    let path = match item {
                        ItemKey::Named(name) => format!("{}.{}[{}]", base, name, index),
                        ItemKey::Indexed => format!("{}.{}", base, entry.key),
                    };
                    index += 1;
                    match node {
                        Node::Block(b) => {
                            if let Some(child) = self.map_child::<T>(b, path, Some(entry.pos)) {
                                list.push(child);
                            }
                        }
                        other => {
                            let diag = Diagnostic::new(
                                DiagnosticKind::Schema,
                                format!(
                                    "{}.{}: expected block, found {}",
                                    self.schema.name,
                                    key,
                                    other.kind_name()
                                ),
                            )
                            .at(entry.pos)
                            .with_path(path);
                            self.diagnostics.push(diag);
                        }
                    }
                }
            }
        }
        list
    }
}

/// Checks the schema's required fields, then lets the entity read itself.
fn read_checked<T: Entity>(reader: &mut FieldReader<'_>) -> SchemaResult<T> {
    reader.check_required()?;
    T::read(reader)
}

/// Collects an entity's fields and lays them out in schema order.
pub struct FieldWriter {
    schema: &'static EntitySchema,
    fields: Vec<(String, Node)>,
}

impl FieldWriter {
    pub fn new(schema: &'static EntitySchema) -> Self {
        Self {
            schema,
            fields: Vec::new(),
        }
    }

    fn kind(&self, key: &str) -> Option<FieldKind> {
        self.schema.field(key).map(|f| f.kind)
    }

    fn put(&mut self, key: &str, node: Node) {
        self.fields.push((key.to_owned(), node));
    }

    fn scalar(&mut self, key: &str, value: Option<Value>) {
        if let Some(value) = value {
            self.put(key, Node::Scalar(Scalar::new(value)));
        }
    }

    pub fn int(&mut self, key: &str, value: Option<i64>) {
        self.scalar(key, value.map(Value::Int));
    }

    pub fn float(&mut self, key: &str, value: Option<f64>) {
        self.scalar(key, value.map(Value::Float));
    }

    pub fn flag(&mut self, key: &str, value: Option<bool>) {
        self.scalar(key, value.map(|b| Value::Int(i64::from(b))));
    }

    /// Text, quoted unless the field is declared `Word` and the value is
    /// bareword-safe, as in `DoseVolume = \XDR:3\;`.
    pub fn text<S: AsRef<str>>(&mut self, key: &str, value: Option<S>) {
        let bare = self.kind(key) == Some(FieldKind::Word);
        self.scalar(
            key,
            value.map(|s| {
                let s = s.as_ref();
                if bare && is_bareword_safe(s) {
                    Value::Word(s.to_owned())
                } else {
                    Value::Text(s.to_owned())
                }
            }),
        );
    }

    pub fn reference(&mut self, key: &str, value: Option<&NamedRef>) {
        self.text(key, value.map(NamedRef::raw));
    }

    pub fn vec3(&mut self, key: &str, value: Option<Vec3>) {
        if let Some(v) = value {
            let mut block = Block::new();
            block.insert("X", Scalar::new(v.x));
            block.insert("Y", Scalar::new(v.y));
            block.insert("Z", Scalar::new(v.z));
            self.put(key, Node::Block(block));
        }
    }

    pub fn dims(&mut self, key: &str, value: GridDims) {
        let mut block = Block::new();
        for (axis, n) in [("X", value.nx), ("Y", value.ny), ("Z", value.nz)] {
            block.insert(axis, Scalar::new(Value::Int(n as i64)));
        }
        self.put(key, Node::Block(block));
    }

    pub fn float_array(&mut self, key: &str, value: Option<&[f64]>) {
        if let Some(values) = value {
            let node = Node::Array(values.iter().map(|&f| Scalar::new(f)).collect());
            self.put(key, node);
        }
    }

    pub fn child<T: Entity>(&mut self, key: &str, slot: &OwnedSlot<T>) {
        if let Some(child) = slot.get() {
            self.put(key, Node::Block(write_entity(child)));
        }
    }

    /// Writes a container block. Every item gets its own statement, so a
    /// one-element list comes back as exactly one item statement.
    pub fn children<T: Entity>(&mut self, key: &str, list: &OwnedList<T>) {
        let Some(FieldKind::ChildList { item, .. }) = self.kind(key) else {
            warn!(entity = self.schema.name, key, "not declared as a child list; skipping");
            return;
        };
        let mut container = Block::new();
        for extra in list.extras.iter().filter(|e| e.anchor.is_none()) {
            container.insert(extra.key.clone(), extra.node.clone());
        }
        for (i, child) in list.iter().enumerate() {
            container.insert(item.key_for(i), write_entity(child));
        }
        for extra in list.extras.iter().filter(|e| e.anchor.is_some()) {
            container.insert(extra.key.clone(), extra.node.clone());
        }
        self.put(key, Node::Block(container));
    }

    /// Lays out the collected fields in schema order with the entity's
    /// unknown keys placed after the known key they followed.
    pub fn finish(self, meta: &EntityMeta) -> Block {
        let schema = self.schema;
        let rank = |key: &str| schema.position(key).map_or(usize::MAX, |p| p + 1);
        let mut slots: Vec<(usize, u8, String, Node)> = self
            .fields
            .into_iter()
            .map(|(key, node)| (rank(key.as_str()), 0, key, node))
            .collect();
        for extra in meta.extras.iter() {
            let r = extra.anchor.as_deref().map_or(0, rank);
            slots.push((r, 1, extra.key.clone(), extra.node.clone()));
        }
        slots.sort_by_key(|(r, tier, _, _)| (*r, *tier));

        let mut block = Block::new();
        for (_, _, key, node) in slots {
            block.insert(key, node);
        }
        block
    }
}

/// Maps a block onto an entity, reporting dropped children into
/// `diagnostics`.
pub fn map_entity<T: Entity>(
    block: &Block,
    path: &str,
    diagnostics: &mut Diagnostics,
) -> SchemaResult<T> {
    let mut reader = FieldReader::new(T::schema(), block, path, diagnostics);
    read_checked::<T>(&mut reader)
}

/// Maps a whole document whose top-level statements are the entity's fields.
pub fn map_root<T: Entity>(doc: &Document, diagnostics: &mut Diagnostics) -> SchemaResult<T> {
    map_entity(&doc.root, "", diagnostics)
}

/// Rebuilds the generic block of an entity.
pub fn write_entity<T: Entity>(entity: &T) -> Block {
    let mut writer = FieldWriter::new(T::schema());
    entity.write(&mut writer);
    writer.finish(entity.meta())
}

pub fn root_document<T: Entity>(entity: &T) -> Document {
    Document::from_block(write_entity(entity))
}

/// Entities read from a file of repeated top-level records.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    pub items: Vec<T>,
    /// Top-level statements that are not records.
    pub extras: Extras,
}

/// Maps a file of repeated records.
///
/// Records may sit at top level (`Trial ={..}; Trial ={..};`) or inside a
/// wrapper block (`TrialList ={ Trial ={..}; };`). A record that fails its
/// schema is reported and dropped; the rest are kept.
pub fn map_collection<T: Entity>(
    doc: &Document,
    wrapper: &str,
    item: &str,
    diagnostics: &mut Diagnostics,
) -> Collection<T> {
    let mut out = Collection {
        items: Vec::new(),
        extras: Extras::new(),
    };
    let mut anchor: Option<&str> = None;
    let mut index = 0;
    let mut take = |entry_key: &str, node: &Node, pos: SourcePos, out: &mut Collection<T>| {
        for record in node.items() {
            let path = format!("{}[{}]", item, index);
            index += 1;
            let Node::Block(block) = record else {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::Schema,
                        format!("{}: expected block, found {}", entry_key, record.kind_name()),
                    )
                    .at(pos)
                    .with_path(path),
                );
                continue;
            };
            let mut reader = FieldReader::new(T::schema(), block, path, &mut *diagnostics).at(pos);
            match read_checked::<T>(&mut reader) {
                Ok(entity) => out.items.push(entity),
                Err(err) => {
                    warn!(entity = T::TYPE_NAME, path = %err.path, "dropping entity: {}", err);
                    diagnostics.push(err.to_diagnostic());
                }
            }
        }
    };

    for entry in &doc.root {
        if entry.key == item {
            take(&entry.key, &entry.node, entry.pos, &mut out);
            anchor = Some(item);
        } else if entry.key == wrapper {
            for wrapped in entry.node.items() {
                let Node::Block(block) = wrapped else {
                    out.extras.push(entry.key.clone(), wrapped.clone(), anchor);
                    continue;
                };
                for inner in block {
                    if inner.key == item {
                        take(&inner.key, &inner.node, inner.pos, &mut out);
                        anchor = Some(item);
                    } else {
                        out.extras.push(inner.key.clone(), inner.node.clone(), anchor);
                    }
                }
            }
        } else {
            out.extras.push(entry.key.clone(), entry.node.clone(), anchor);
        }
    }
    out
}

/// Rebuilds a file of top-level records, with its extras before or after
/// the records as they were read.
pub fn collection_document<'e, T: Entity + 'e>(
    item: &str,
    items: impl IntoIterator<Item = &'e T>,
    extras: &Extras,
) -> Document {
    let mut root = Block::new();
    for extra in extras.iter().filter(|e| e.anchor.is_none()) {
        root.insert(extra.key.clone(), extra.node.clone());
    }
    for entity in items {
        root.insert(item, write_entity(entity));
    }
    for extra in extras.iter().filter(|e| e.anchor.is_some()) {
        root.insert(extra.key.clone(), extra.node.clone());
    }
    Document::from_block(root)
}
