use anyhow::Context;
use rubato::Resampler;

/// Resample mono f32 PCM to a target rate.
///
/// Used in both directions: capture-rate down to the upload rate, and reply
/// clips up to whatever the output device runs at.
pub fn resample_mono(
    input_samples: &[f32],
    input_rate_hz: u32,
    target_rate_hz: u32,
) -> anyhow::Result<Vec<f32>> {
    if input_rate_hz == target_rate_hz || input_samples.is_empty() {
        return Ok(input_samples.to_vec());
    }

    let input_rate_hz: usize = input_rate_hz.try_into().context("invalid input sample rate")?;
    let target_rate_hz: usize = target_rate_hz
        .try_into()
        .context("invalid target sample rate")?;

    let params = rubato::SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: rubato::SincInterpolationType::Cubic,
        oversampling_factor: 256,
        window: rubato::WindowFunction::BlackmanHarris2,
    };

    let mut resampler = rubato::SincFixedIn::<f32>::new(
        target_rate_hz as f64 / input_rate_hz as f64,
        2.0,
        params,
        input_samples.len(),
        1,
    )
    .context("create resampler")?;

    let input = vec![input_samples.to_vec()];
    let out = resampler.process(&input, None).context("resample")?;
    Ok(out.into_iter().next().unwrap_or_default())
}
