use imgvec_core::config::ModelSettings;
use imgvec_embed::get_default_extractor;

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "test_data/cat.jpg".to_string());
    let pixels = imgvec_image::decode_rgb(&std::fs::read(&path)?)?;
    let input = imgvec_image::preprocess(&pixels)?;
    let extractor = get_default_extractor(&ModelSettings::default())?;
    let v = extractor.extract(&input)?;
    println!("{} -> dim={} head={:?}", path, v.len(), &v.as_slice()[..v.len().min(5)]);
    Ok(())
}
