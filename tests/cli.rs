use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_document(version: &str) -> NamedTempFile {
    let document = format!(
        r##"<?xml version="1.0" encoding="utf-8"?>
<COLLADA xmlns="http://www.collada.org/2005/11/COLLADASchema" version="{version}">
  <library_geometries>
    <geometry id="Plane-mesh" name="Plane">
      <mesh>
        <source id="Plane-positions">
          <float_array count="12">-1 -1 0 1 -1 0 1 1 0 -1 1 0</float_array>
          <technique_common><accessor count="4" stride="3"/></technique_common>
        </source>
        <vertices id="Plane-vertices">
          <input semantic="POSITION" source="#Plane-positions"/>
        </vertices>
        <triangles material="Material" count="2">
          <input semantic="VERTEX" source="#Plane-vertices" offset="0"/>
          <p>0 1 2 0 2 3</p>
        </triangles>
      </mesh>
    </geometry>
  </library_geometries>
  <library_visual_scenes>
    <visual_scene id="Scene">
      <node id="Plane" name="Plane">
        <translate>0 0 0</translate>
        <instance_geometry url="#Plane-mesh"/>
      </node>
      <node id="Plane2" name="Plane2">
        <translate>3 0 0</translate>
        <rotate sid="rotation_z">0 0 1 90</rotate>
        <instance_geometry url="#Plane-mesh"/>
      </node>
    </visual_scene>
  </library_visual_scenes>
</COLLADA>
"##
    );
    let mut tmp = NamedTempFile::new().expect("temp document");
    tmp.write_all(document.as_bytes()).expect("write document");
    tmp
}

#[test]
fn cli_prints_models_and_instances() {
    let document = write_document("1.4.1");
    let mut cmd = Command::cargo_bin("dae-import").expect("binary exists");
    cmd.arg(document.path()).arg("--optimize-points");
    cmd.assert()
        .success()
        .stdout(contains(
            "Imported 1 model(s) with 2 instance(s) from scene Scene",
        ))
        .stdout(contains(
            " - Plane (Plane-mesh) instances=2 meshes=1 vertices=4 indices=6",
        ))
        .stdout(contains(
            "   [1] pos=(3.00, 0.00, 0.00) rot=(0.00, 0.00, 90.00) scale=(1.00, 1.00, 1.00)",
        ));
}

#[test]
fn cli_reports_format_errors() {
    let document = write_document("1.3.0");
    let mut cmd = Command::cargo_bin("dae-import").expect("binary exists");
    cmd.arg(document.path());
    cmd.assert()
        .code(2)
        .stderr(contains("unsupported version 1.3.0"));
}

#[test]
fn cli_rejects_unknown_flags() {
    let document = write_document("1.4.1");
    let mut cmd = Command::cargo_bin("dae-import").expect("binary exists");
    cmd.arg(document.path()).arg("--fast");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --fast"));
}
