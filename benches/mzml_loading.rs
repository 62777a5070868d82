use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lcms_qc::mzml::MzMLStreamer;
use lcms_qc::run::Run;

fn generate_test_mzml(num_spectra: usize, peaks_per_spectrum: usize) -> Vec<u8> {
    let mut mzml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>
<mzML xmlns="http://psi.hupo.org/ms/mzml" version="1.1.0">
  <run id="bench_run">
    <spectrumList count=""#);
    mzml.push_str(&num_spectra.to_string());
    mzml.push_str(r#"">"#);

    for i in 0..num_spectra {
        let rt = (i as f64) * 0.01;

        let mz_values: Vec<f64> = (0..peaks_per_spectrum)
            .map(|j| 100.0 + (j as f64) * 10.0 + (i as f64) * 0.001)
            .collect();
        let intensity_values: Vec<f32> = (0..peaks_per_spectrum)
            .map(|j| 1000.0 + (j as f32) * 50.0)
            .collect();

        let mz_bytes: Vec<u8> = mz_values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let intensity_bytes: Vec<u8> = intensity_values
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();

        let mz_base64 = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &mz_bytes);
        let intensity_base64 =
            base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &intensity_bytes);

        mzml.push_str(&format!(
            r#"
      <spectrum index="{}" id="scan={}" defaultArrayLength="{}">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="1"/>
        <cvParam cvRef="MS" accession="MS:1000130" name="positive scan"/>
        <scanList count="1">
          <scan>
            <cvParam cvRef="MS" accession="MS:1000016" name="scan start time" value="{}" unitCvRef="UO" unitAccession="UO:0000031" unitName="minute"/>
          </scan>
        </scanList>
        <binaryDataArrayList count="2">
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000514" name="m/z array"/>
            <binary>{}</binary>
          </binaryDataArray>
          <binaryDataArray>
            <cvParam cvRef="MS" accession="MS:1000521" name="32-bit float"/>
            <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
            <cvParam cvRef="MS" accession="MS:1000515" name="intensity array"/>
            <binary>{}</binary>
          </binaryDataArray>
        </binaryDataArrayList>
      </spectrum>"#,
            i,
            i + 1,
            peaks_per_spectrum,
            rt,
            mz_base64,
            intensity_base64
        ));
    }

    mzml.push_str(
        r#"
    </spectrumList>
  </run>
</mzML>"#,
    );

    mzml.into_bytes()
}

fn bench_streamer(c: &mut Criterion) {
    let mut group = c.benchmark_group("mzml_streamer");

    for num_spectra in [100, 1000] {
        let data = generate_test_mzml(num_spectra, 200);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(num_spectra), &data, |b, data| {
            b.iter(|| {
                let mut streamer = MzMLStreamer::new(Cursor::new(data.as_slice())).unwrap();
                let mut count = 0;
                while let Some(spectrum) = streamer.next_spectrum().unwrap() {
                    count += spectrum.mz_array.len();
                }
                black_box(count)
            });
        });
    }

    group.finish();
}

fn bench_run_loading(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_from_reader");

    for peaks in [50, 500] {
        let data = generate_test_mzml(500, peaks);
        group.throughput(Throughput::Elements(500));
        group.bench_with_input(BenchmarkId::from_parameter(peaks), &data, |b, data| {
            b.iter(|| {
                let run = Run::from_reader(Cursor::new(data.as_slice())).unwrap();
                black_box(run.ms_scans().len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_streamer, bench_run_loading);
criterion_main!(benches);
