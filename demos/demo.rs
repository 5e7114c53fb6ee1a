// A 3 × 3 grid of 1.5in axes in the light and dark styles, with a
// colorbar next to an image.

use std::error::Error;
use ndarray::Array2;
use plothelper::{fixed_size_subplots, Format, GridSpec, Preset, Style};

fn main() -> Result<(), Box<dyn Error>> {
    let spec = GridSpec::new(3, 3).cell_size(1.5, 1.5);
    let x: Vec<_> = (-100 .. 100).map(f64::from).collect();
    let y: Vec<_> = x.iter().map(|x| x.sin()).collect();
    let image = Array2::from_shape_fn((100, 100), |(i, j)| {
        let (u, v) = (i as f64 / 50. - 1., j as f64 / 50. - 1.);
        (10. * (u * u + v * v)).sin() / 10.
    });

    for (preset, suffix) in [(Preset::Light, ""), (Preset::Dark, "_dark")] {
        let style = Style::preset(Preset::Base)
            .layer(&Style::preset(preset))
            .layer(&Style::preset(Preset::Transparent));
        let (fig, mut axs) = fixed_size_subplots(&spec, &style)?;

        // Row 0 is the bottom row.
        let ax = axs.get_mut(2, 0).ok_or("no axes")?;
        ax.xy(&x, &y).plot()?;
        ax.minorticks_on()?.set_title("Demo Plot")?
            .set_xlabel("X Axis")?.set_ylabel("Y Axis γ")?;

        let ax = axs.get_mut(2, 2).ok_or("no axes")?;
        let im = ax.imshow(&image, "viridis")?;
        ax.colorbar(&im).aspect(20.).pad(0.05).add()?;

        fig.save_all(format!("target/demo{}", suffix), &Format::ALL)?;
    }
    Ok(())
}
