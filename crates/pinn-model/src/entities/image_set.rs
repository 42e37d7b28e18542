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


use crate::error::SchemaResult;
use crate::graph::EntityNode;
use crate::mapper::{Entity, FieldReader, FieldWriter};
use crate::meta::{EntityId, EntityMeta};
use crate::owned::OwnedList;
use crate::schema::{EntitySchema, FieldKind, FieldSpec};

static IMAGE_SET_SCHEMA: EntitySchema = EntitySchema {
    name: "ImageSet",
    fields: &[
        FieldSpec::optional("x_dim", FieldKind::Int),
        FieldSpec::optional("y_dim", FieldKind::Int),
        FieldSpec::optional("z_dim", FieldKind::Int),
        FieldSpec::optional("t_dim", FieldKind::Int),
        FieldSpec::optional("datatype", FieldKind::Int),
        FieldSpec::optional("bitpix", FieldKind::Int),
        FieldSpec::optional("bytes_pix", FieldKind::Int),
        FieldSpec::optional("byte_order", FieldKind::Int),
        FieldSpec::optional("x_pixdim", FieldKind::Float),
        FieldSpec::optional("y_pixdim", FieldKind::Float),
        FieldSpec::optional("z_pixdim", FieldKind::Float),
        FieldSpec::optional("t_pixdim", FieldKind::Float),
        FieldSpec::optional("x_start", FieldKind::Float),
        FieldSpec::optional("y_start", FieldKind::Float),
        FieldSpec::optional("z_start", FieldKind::Float),
        FieldSpec::optional("t_start", FieldKind::Float),
        FieldSpec::optional("vol_max", FieldKind::Float),
        FieldSpec::optional("vol_min", FieldKind::Float),
        FieldSpec::optional("db_name", FieldKind::Word),
        FieldSpec::optional("medical_record", FieldKind::Word),
        FieldSpec::optional("originator", FieldKind::Word),
        FieldSpec::optional("date", FieldKind::Word),
        FieldSpec::optional("scanner_id", FieldKind::Word),
        FieldSpec::optional("patient_position", FieldKind::Word),
        FieldSpec::optional("orientation", FieldKind::Int),
        FieldSpec::optional("scan_acquisition", FieldKind::Int),
        FieldSpec::optional("comment", FieldKind::Word),
        FieldSpec::optional("fname_format", FieldKind::Word),
        FieldSpec::optional("fname_index_start", FieldKind::Int),
        FieldSpec::optional("fname_index_delta", FieldKind::Int),
        FieldSpec::optional("binary_header_size", FieldKind::Int),
        FieldSpec::optional("manufacturer", FieldKind::Word),
        FieldSpec::optional("model", FieldKind::Word),
        FieldSpec::optional("couch_pos", FieldKind::Float),
        FieldSpec::optional("couch_height", FieldKind::Float),
        FieldSpec::optional("x_offset", FieldKind::Float),
        FieldSpec::optional("y_offset", FieldKind::Float),
        FieldSpec::optional("dataset_modified", FieldKind::Int),
    ],
};

static IMAGE_INFO_SCHEMA: EntitySchema = EntitySchema {
    name: "ImageInfo",
    fields: &[
        FieldSpec::optional("TablePosition", FieldKind::Float),
        FieldSpec::optional("CouchPos", FieldKind::Float),
        FieldSpec::optional("SliceNumber", FieldKind::Int),
        FieldSpec::optional("SeriesUID", FieldKind::Text),
        FieldSpec::optional("StudyInstanceUID", FieldKind::Text),
        FieldSpec::optional("FrameUID", FieldKind::Text),
        FieldSpec::optional("ClassUID", FieldKind::Text),
        FieldSpec::optional("InstanceUID", FieldKind::Text),
        FieldSpec::optional("SUVDICOMScale", FieldKind::Float),
        FieldSpec::optional("ColorLUTScale", FieldKind::Float),
        FieldSpec::optional("DICOMFileName", FieldKind::Text),
        FieldSpec::optional("AcquisitionTime", FieldKind::Text),
        FieldSpec::optional("ImageTime", FieldKind::Text),
    ],
};

/// An image set's metadata, read from `ImageSet_<id>.header`, with the
/// per-slice records of `ImageSet_<id>.ImageInfo`.
///
/// The header is flat and written with lower-case keys, many of them as
/// `key : value` lines. The pixel volume itself is not read.
#[derive(Debug, PartialEq)]
pub struct ImageSet {
    /// Taken from the file name, not the header.
    pub image_set_id: i64,
    pub x_dim: Option<i64>,
    pub y_dim: Option<i64>,
    pub z_dim: Option<i64>,
    pub t_dim: Option<i64>,
    pub datatype: Option<i64>,
    pub bitpix: Option<i64>,
    pub bytes_pix: Option<i64>,
    pub byte_order: Option<i64>,
    pub x_pixdim: Option<f64>,
    pub y_pixdim: Option<f64>,
    pub z_pixdim: Option<f64>,
    pub t_pixdim: Option<f64>,
    pub x_start: Option<f64>,
    pub y_start: Option<f64>,
    pub z_start: Option<f64>,
    pub t_start: Option<f64>,
    pub vol_max: Option<f64>,
    pub vol_min: Option<f64>,
    pub db_name: Option<String>,
    pub medical_record: Option<String>,
    pub originator: Option<String>,
    pub date: Option<String>,
    pub scanner_id: Option<String>,
    pub patient_position: Option<String>,
    pub orientation: Option<i64>,
    pub scan_acquisition: Option<i64>,
    pub comment: Option<String>,
    pub fname_format: Option<String>,
    pub fname_index_start: Option<i64>,
    pub fname_index_delta: Option<i64>,
    pub binary_header_size: Option<i64>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub couch_pos: Option<f64>,
    pub couch_height: Option<f64>,
    pub x_offset: Option<f64>,
    pub y_offset: Option<f64>,
    pub dataset_modified: Option<i64>,
    image_info: OwnedList<ImageInfo>,
    meta: EntityMeta,
}

owning_clone!(ImageSet {
    image_set_id,
    x_dim,
    y_dim,
    z_dim,
    t_dim,
    datatype,
    bitpix,
    bytes_pix,
    byte_order,
    x_pixdim,
    y_pixdim,
    z_pixdim,
    t_pixdim,
    x_start,
    y_start,
    z_start,
    t_start,
    vol_max,
    vol_min,
    db_name,
    medical_record,
    originator,
    date,
    scanner_id,
    patient_position,
    orientation,
    scan_acquisition,
    comment,
    fname_format,
    fname_index_start,
    fname_index_delta,
    binary_header_size,
    manufacturer,
    model,
    couch_pos,
    couch_height,
    x_offset,
    y_offset,
    dataset_modified,
} owns { image_info });

impl ImageSet {
    pub fn new(image_set_id: i64) -> Self {
        let meta = EntityMeta::new();
        Self {
            image_set_id,
            x_dim: None,
            y_dim: None,
            z_dim: None,
            t_dim: None,
            datatype: None,
            bitpix: None,
            bytes_pix: None,
            byte_order: None,
            x_pixdim: None,
            y_pixdim: None,
            z_pixdim: None,
            t_pixdim: None,
            x_start: None,
            y_start: None,
            z_start: None,
            t_start: None,
            vol_max: None,
            vol_min: None,
            db_name: None,
            medical_record: None,
            originator: None,
            date: None,
            scanner_id: None,
            patient_position: None,
            orientation: None,
            scan_acquisition: None,
            comment: None,
            fname_format: None,
            fname_index_start: None,
            fname_index_delta: None,
            binary_header_size: None,
            manufacturer: None,
            model: None,
            couch_pos: None,
            couch_height: None,
            x_offset: None,
            y_offset: None,
            dataset_modified: None,
            image_info: OwnedList::new(meta.id()),
            meta,
        }
    }

    /// Stem shared by the image set's files.
    pub fn file_stem(&self) -> String {
        format!("ImageSet_{}", self.image_set_id)
    }

    /// `(x, y, z)` voxel counts when all three are present and positive.
    pub fn dims(&self) -> Option<(usize, usize, usize)> {
        let dim = |d: Option<i64>| d.and_then(|d| usize::try_from(d).ok()).filter(|&d| d > 0);
        Some((dim(self.x_dim)?, dim(self.y_dim)?, dim(self.z_dim)?))
    }

    pub fn image_info(&self) -> &OwnedList<ImageInfo> {
        &self.image_info
    }

    pub fn image_info_mut(&mut self) -> &mut OwnedList<ImageInfo> {
        &mut self.image_info
    }

    pub fn slice(&self, slice_number: i64) -> Option<&ImageInfo> {
        self.image_info
            .iter()
            .find(|i| i.slice_number == Some(slice_number))
    }
}

impl Entity for ImageSet {
    const TYPE_NAME: &'static str = "ImageSet";

    fn schema() -> &'static EntitySchema {
        &IMAGE_SET_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        let meta = r.meta();
        let id = meta.id();
        Ok(Self {
            image_set_id: 0,
            x_dim: r.opt_int("x_dim")?,
            y_dim: r.opt_int("y_dim")?,
            z_dim: r.opt_int("z_dim")?,
            t_dim: r.opt_int("t_dim")?,
            datatype: r.opt_int("datatype")?,
            bitpix: r.opt_int("bitpix")?,
            bytes_pix: r.opt_int("bytes_pix")?,
            byte_order: r.opt_int("byte_order")?,
            x_pixdim: r.opt_float("x_pixdim")?,
            y_pixdim: r.opt_float("y_pixdim")?,
            z_pixdim: r.opt_float("z_pixdim")?,
            t_pixdim: r.opt_float("t_pixdim")?,
            x_start: r.opt_float("x_start")?,
            y_start: r.opt_float("y_start")?,
            z_start: r.opt_float("z_start")?,
            t_start: r.opt_float("t_start")?,
            vol_max: r.opt_float("vol_max")?,
            vol_min: r.opt_float("vol_min")?,
            db_name: r.opt_text("db_name")?,
            medical_record: r.opt_text("medical_record")?,
            originator: r.opt_text("originator")?,
            date: r.opt_text("date")?,
            scanner_id: r.opt_text("scanner_id")?,
            patient_position: r.opt_text("patient_position")?,
            orientation: r.opt_int("orientation")?,
            scan_acquisition: r.opt_int("scan_acquisition")?,
            comment: r.opt_text("comment")?,
            fname_format: r.opt_text("fname_format")?,
            fname_index_start: r.opt_int("fname_index_start")?,
            fname_index_delta: r.opt_int("fname_index_delta")?,
            binary_header_size: r.opt_int("binary_header_size")?,
            manufacturer: r.opt_text("manufacturer")?,
            model: r.opt_text("model")?,
            couch_pos: r.opt_float("couch_pos")?,
            couch_height: r.opt_float("couch_height")?,
            x_offset: r.opt_float("x_offset")?,
            y_offset: r.opt_float("y_offset")?,
            dataset_modified: r.opt_int("dataset_modified")?,
            image_info: OwnedList::new(id),
            meta,
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.int("x_dim", self.x_dim);
        w.int("y_dim", self.y_dim);
        w.int("z_dim", self.z_dim);
        w.int("t_dim", self.t_dim);
        w.int("datatype", self.datatype);
        w.int("bitpix", self.bitpix);
        w.int("bytes_pix", self.bytes_pix);
        w.int("byte_order", self.byte_order);
        w.float("x_pixdim", self.x_pixdim);
        w.float("y_pixdim", self.y_pixdim);
        w.float("z_pixdim", self.z_pixdim);
        w.float("t_pixdim", self.t_pixdim);
        w.float("x_start", self.x_start);
        w.float("y_start", self.y_start);
        w.float("z_start", self.z_start);
        w.float("t_start", self.t_start);
        w.float("vol_max", self.vol_max);
        w.float("vol_min", self.vol_min);
        w.text("db_name", self.db_name.as_ref());
        w.text("medical_record", self.medical_record.as_ref());
        w.text("originator", self.originator.as_ref());
        w.text("date", self.date.as_ref());
        w.text("scanner_id", self.scanner_id.as_ref());
        w.text("patient_position", self.patient_position.as_ref());
        w.int("orientation", self.orientation);
        w.int("scan_acquisition", self.scan_acquisition);
        w.text("comment", self.comment.as_ref());
        w.text("fname_format", self.fname_format.as_ref());
        w.int("fname_index_start", self.fname_index_start);
        w.int("fname_index_delta", self.fname_index_delta);
        w.int("binary_header_size", self.binary_header_size);
        w.text("manufacturer", self.manufacturer.as_ref());
        w.text("model", self.model.as_ref());
        w.float("couch_pos", self.couch_pos);
        w.float("couch_height", self.couch_height);
        w.float("x_offset", self.x_offset);
        w.float("y_offset", self.y_offset);
        w.int("dataset_modified", self.dataset_modified);
    }
}

impl EntityNode for ImageSet {
    node_meta!("ImageSet");

    fn children(&self) -> Vec<&dyn EntityNode> {
        self.image_info.iter().map(|i| i as &dyn EntityNode).collect()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn EntityNode> {
        self.image_info
            .items_mut()
            .iter_mut()
            .map(|i| i as &mut dyn EntityNode)
            .collect()
    }

    fn remove_child(&mut self, id: EntityId) -> bool {
        self.image_info.remove_by_id(id).is_some()
    }
}

/// One slice record of an image set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageInfo {
    pub table_position: Option<f64>,
    pub couch_pos: Option<f64>,
    pub slice_number: Option<i64>,
    pub series_uid: Option<String>,
    pub study_instance_uid: Option<String>,
    pub frame_uid: Option<String>,
    pub class_uid: Option<String>,
    pub instance_uid: Option<String>,
    pub suv_dicom_scale: Option<f64>,
    pub color_lut_scale: Option<f64>,
    pub dicom_file_name: Option<String>,
    pub acquisition_time: Option<String>,
    pub image_time: Option<String>,
    meta: EntityMeta,
}

impl ImageInfo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Entity for ImageInfo {
    const TYPE_NAME: &'static str = "ImageInfo";

    fn schema() -> &'static EntitySchema {
        &IMAGE_INFO_SCHEMA
    }

    entity_meta!();

    fn read(r: &mut FieldReader<'_>) -> SchemaResult<Self> {
        Ok(Self {
            table_position: r.opt_float("TablePosition")?,
            couch_pos: r.opt_float("CouchPos")?,
            slice_number: r.opt_int("SliceNumber")?,
            series_uid: r.opt_text("SeriesUID")?,
            study_instance_uid: r.opt_text("StudyInstanceUID")?,
            frame_uid: r.opt_text("FrameUID")?,
            class_uid: r.opt_text("ClassUID")?,
            instance_uid: r.opt_text("InstanceUID")?,
            suv_dicom_scale: r.opt_float("SUVDICOMScale")?,
            color_lut_scale: r.opt_float("ColorLUTScale")?,
            dicom_file_name: r.opt_text("DICOMFileName")?,
            acquisition_time: r.opt_text("AcquisitionTime")?,
            image_time: r.opt_text("ImageTime")?,
            meta: r.meta(),
        })
    }

    fn write(&self, w: &mut FieldWriter) {
        w.float("TablePosition", self.table_position);
        w.float("CouchPos", self.couch_pos);
        w.int("SliceNumber", self.slice_number);
        w.text("SeriesUID", self.series_uid.as_ref());
        w.text("StudyInstanceUID", self.study_instance_uid.as_ref());
        w.text("FrameUID", self.frame_uid.as_ref());
        w.text("ClassUID", self.class_uid.as_ref());
        w.text("InstanceUID", self.instance_uid.as_ref());
        w.float("SUVDICOMScale", self.suv_dicom_scale);
        w.float("ColorLUTScale", self.color_lut_scale);
        w.text("DICOMFileName", self.dicom_file_name.as_ref());
        w.text("AcquisitionTime", self.acquisition_time.as_ref());
        w.text("ImageTime", self.image_time.as_ref());
    }
}

impl EntityNode for ImageInfo {
    node_meta!("ImageInfo");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{map_collection, map_root};
    use pinn_core::{parse, Diagnostics};

    #[test]
    fn test_header_with_colon_lines() {
        let text = "x_dim = 512;\ny_dim = 512;\nz_dim = 90;\nz_pixdim = 0.3;\n\
                    db_name : PATIENT;\ndate : 20200101;\ncomment : head and neck;\n\
                    vendor_tag : 7;\n";
        let parsed = parse(text.as_bytes()).unwrap();
        assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        let mut diags = Diagnostics::new();
        let set: ImageSet = map_root(&parsed.document, &mut diags).unwrap();
        assert!(diags.is_empty());
        assert_eq!(set.dims(), Some((512, 512, 90)));
        assert_eq!(set.z_pixdim, Some(0.3));
        assert_eq!(set.db_name.as_deref(), Some("PATIENT"));
        assert_eq!(set.date.as_deref(), Some("20200101"));
        assert_eq!(set.comment.as_deref(), Some("head and neck"));
        assert!(set.meta().extras.get("vendor_tag").is_some());
    }

    #[test]
    fn test_dims_need_all_three() {
        let mut set = ImageSet::new(2);
        set.x_dim = Some(4);
        set.y_dim = Some(4);
        assert_eq!(set.dims(), None);
        set.z_dim = Some(0);
        assert_eq!(set.dims(), None);
        set.z_dim = Some(3);
        assert_eq!(set.dims(), Some((4, 4, 3)));
        assert_eq!(set.file_stem(), "ImageSet_2");
    }

    #[test]
    fn test_image_info_records() {
        let text = "ImageInfoList ={\n  ImageInfo ={ SliceNumber = 1; TablePosition = -1.5; \
                    InstanceUID = \"1.2.3.1\"; };\n  ImageInfo ={ SliceNumber = 2; \
                    TablePosition = -1.2; InstanceUID = \"1.2.3.2\"; };\n};\n";
        let parsed = parse(text.as_bytes()).unwrap();
        let mut diags = Diagnostics::new();
        let infos =
            map_collection::<ImageInfo>(&parsed.document, "ImageInfoList", "ImageInfo", &mut diags);
        assert!(diags.is_empty());
        let mut set = ImageSet::new(0);
        for info in infos.items {
            set.image_info_mut().push(info);
        }
        assert_eq!(set.image_info().len(), 2);
        assert_eq!(set.slice(2).unwrap().table_position, Some(-1.2));
        assert_eq!(set.slice(2).unwrap().meta().parent(), Some(set.meta().id()));
        assert!(set.slice(3).is_none());
    }
}
