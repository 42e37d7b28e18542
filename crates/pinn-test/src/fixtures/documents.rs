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

/// The `Patient` file: demographics and the plan summary list.
pub fn patient() -> &'static str {
    r#"// Patient record
PatientID = 1001;
MedicalRecordNumber = "MRN-1001";
LastName = "DOE";
FirstName = "JANE";
MiddleName = "Q";
DateOfBirth = "1960-04-12";
Gender = "Female";
RadiationOncologist = "SMITH";
Comment = "";
DirSize = 12.5;
PlanList ={
  Plan ={
    PlanID = 0;
    PlanName = "Prostate";
    Physicist = "LEE";
    Dosimetrist = "KIM";
    PrimaryCTImageSetID = 0;
    ToolType = "Pinnacle^3";
    PinnacleVersionDescription = "Pinnacle 16.2";
  };
};
"#
}

/// `plan.Trial`: one trial, a 4x3x2 dose grid, two beams.
pub fn plan_trial() -> &'static str {
    r#"Trial ={
  Name = "Trial_1";
  DoseGrid ={
    VoxelSize ={
      X = 0.4;
      Y = 0.4;
      Z = 0.5;
    };
    Dimension ={
      X = 4;
      Y = 3;
      Z = 2;
    };
    Origin ={
      X = -10.0;
      Y = -8.0;
      Z = -2.0;
    };
    Display2d = 1;
    DoseSummationType = 1;
  };
  PrescriptionList ={
    Prescription ={
      Name = "Prostate";
      RequestedMonitorUnitsPerFraction = 200;
      PrescriptionDose = 7800;
      PrescriptionPercent = 100;
      NumberOfFractions = 39;
      PrescriptionPoint = "iso";
      Method = "Prescribe";
      NormalizationMethod = "Point Dose";
      WeightsProportionalTo = "Point Dose";
    };
  };
  BeamList ={
    Beam ={
      Name = "AP";
      BeamNumber = 1;
      IsocenterName = "iso";
      PrescriptionName = "Prostate";
      MachineNameAndVersion = "Linac1: 2020-01-01 10:00:00";
      Modality = "Photons";
      MachineEnergyName = "6X";
      SetBeamType = "Static";
      DoseVolume = \XDR:0\;
      Weight = 0.5;
      ExtendedAngle = 0;
      MonitorUnitInfo ={
        PrescriptionDose = 100.0;
        NormalizedDose = 98.5;
        CollimatorOutputFactor = 0.98;
        TotalTransmissionFraction = 1;
      };
      CPManager ={
        IsGantryStartStopSet = 0;
        NumberOfControlPoints = 1;
        ControlPointList ={
          #0 ={
            Gantry = 0;
            Couch = 0;
            Collimator = 0;
            LeftJawPosition = 5;
            RightJawPosition = 5;
            TopJawPosition = 5;
            BottomJawPosition = 5;
            Weight = 1;
            WeightLocked = 0;
            MLCLeafPositions ={
              RawData ={
                NumberOfDimensions = 2;
                NumberOfPoints = 2;
                Points[] ={
                  -1.0,1.0,
                  -2.0,2.0
                };
              };
            };
          };
        };
      };
    };
    Beam ={
      Name = "LAT";
      BeamNumber = 2;
      IsocenterName = "iso";
      PrescriptionName = "Prostate";
      MachineNameAndVersion = "Linac1: 2020-01-01 10:00:00";
      Modality = "Photons";
      MachineEnergyName = "10X";
      SetBeamType = "Static";
      DoseVolume = \XDR:1\;
      Weight = 0.5;
      CPManager ={
        IsGantryStartStopSet = 0;
        NumberOfControlPoints = 1;
        ControlPointList ={
          #0 ={
            Gantry = 90;
            Couch = 0;
            Collimator = 0;
          };
        };
      };
    };
  };
};
"#
}

/// `plan.Points`: the isocenter and one reference point.
pub fn plan_points() -> &'static str {
    r#"Poi ={
  Name = "iso";
  XCoord = 0.5;
  YCoord = -1.25;
  ZCoord = 3;
  Radius = 1;
  Color = "red";
  CoordSys = "CT";
  VolumeName = "CT1";
  PoiInterpretedType = "ISOCENTER";
  IsLocked = 0;
  Display2d = "Off";
};
Poi ={
  Name = "ref";
  XCoord = 2;
  YCoord = 2;
  ZCoord = 2;
  PoiInterpretedType = "MARKER";
};
"#
}

/// `plan.PatientSetup`: head first, supine.
pub fn plan_setup() -> &'static str {
    r#"Position = "On back (supine)";
Orientation = "Head First Into Scanner";
TableMotion = "Table Moves Into Scanner";
PatientSetup = "HFS";
"#
}

/// `plan.Pinnacle.Machines`: the machine the beams name.
pub fn plan_machines() -> &'static str {
    r#"Machine ={
  Name = "Linac1";
  MachineType = "Varian";
  VersionTimeStamp = "2020-01-01 10:00:00";
  Manufacturer = "Varian";
  Model = "TrueBeam";
  SerialNumber = "1234";
  TolerateMUs = 1;
  PhotonEnergyList ={
    MachineEnergy ={
      Name = "6X";
    };
  };
};
"#
}

/// `plan.Trial` whose only beam names a machine that is not loaded.
pub fn plan_trial_dangling_machine() -> &'static str {
    r#"Trial ={
  Name = "Trial_1";
  BeamList ={
    Beam ={
      Name = "AP";
      MachineNameAndVersion = "Linac2: 2021-06-01";
    };
  };
};
"#
}

/// The institution's `Institution` file, indexing patient 1001.
pub fn institution() -> &'static str {
    r#"InstitutionID = 1;
InstitutionPath = "Institution_1";
Name = "General Hospital";
StreetAddress = "1 Main Street";
City = "Springfield";
Country = "US";
DefaultMountPoint = "Mount_0";
BackupTimeStamp = "";
PatientLiteList ={
  PatientLite ={
    PatientID = 1001;
    PatientPath = "Institution_1/Mount_0/Patient_1001";
    MountPoint = "Mount_0";
    FormattedDescription = "DOE&&JANE&&Q&&MRN-1001&&SMITH&&2020-01-01 10:00:00";
    DirSize = 12.5;
  };
};
"#
}

/// `ImageSet_0.header`: a 4x4x3 CT, mostly in `key : value` form.
pub fn image_set_header() -> &'static str {
    r#"x_dim = 4;
y_dim = 4;
z_dim = 3;
datatype = 1;
bitpix = 16;
bytes_pix = 2;
byte_order = 0;
x_pixdim = 0.1;
y_pixdim = 0.1;
z_pixdim = 0.3;
x_start = -0.2;
y_start = -0.2;
z_start = -0.3;
db_name : PATIENT;
medical_record : MRN-1001;
date : 20200101;
scanner_id : CT1;
patient_position : HFS;
orientation = 0;
comment : head and neck;
fname_format : CT.%03d.dcm;
manufacturer : Philips;
couch_pos = 0.0;
dataset_modified = 0;
"#
}

/// `ImageSet_0.ImageInfo`: one record per slice.
pub fn image_set_info() -> &'static str {
    r#"ImageInfoList ={
  ImageInfo ={
    TablePosition = -0.3;
    SliceNumber = 1;
    SeriesUID = "1.2.840.1";
    InstanceUID = "1.2.840.1.1";
    DICOMFileName = "CT.001.dcm";
  };
  ImageInfo ={
    TablePosition = 0;
    SliceNumber = 2;
    SeriesUID = "1.2.840.1";
    InstanceUID = "1.2.840.1.2";
    DICOMFileName = "CT.002.dcm";
  };
  ImageInfo ={
    TablePosition = 0.3;
    SliceNumber = 3;
    SeriesUID = "1.2.840.1";
    InstanceUID = "1.2.840.1.3";
    DICOMFileName = "CT.003.dcm";
  };
};
"#
}
