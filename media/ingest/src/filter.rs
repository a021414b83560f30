/*!
    Filter graph construction for transcoded streams.

    Each transcoded stream gets its own graph: a buffer source fed with
    decoded frames, the task's filter chain (or a passthrough filter when
    none is configured), and a buffer sink constrained to what the
    encoder accepts.
*/

use ffmpeg_next::{
    channel_layout::ChannelLayout, codec::decoder, filter, format, Rational,
};

use media_types::{Error, Result, StreamFilter};

fn find_filter(name: &str) -> Result<filter::Filter> {
    filter::find(name).ok_or_else(|| Error::FilterSetupFailed(format!("filter {name} not found")))
}

fn graph_with(source_name: &str, source_args: &str, sink_name: &str) -> Result<filter::Graph> {
    let mut graph = filter::Graph::new();

    graph
        .add(&find_filter(source_name)?, "in", source_args)
        .map_err(|e| Error::FilterSetupFailed(format!("creating {source_name}: {e}")))?;
    graph
        .add(&find_filter(sink_name)?, "out", "")
        .map_err(|e| Error::FilterSetupFailed(format!("creating {sink_name}: {e}")))?;

    Ok(graph)
}

fn parse_and_validate(graph: &mut filter::Graph, chain: &str) -> Result<()> {
    graph
        .output("in", 0)
        .and_then(|p| p.input("out", 0))
        .and_then(|p| p.parse(chain))
        .map_err(|e| Error::FilterSetupFailed(format!("parsing \"{chain}\": {e}")))?;
    graph
        .validate()
        .map_err(|e| Error::FilterSetupFailed(format!("configuring \"{chain}\": {e}")))?;
    Ok(())
}

/**
    Build the graph for a transcoded audio stream.

    The source arguments describe the decoder output; the sink is pinned
    to the encoder's sample format, layout and rate so the chain
    negotiates a format the encoder accepts.
*/
pub(crate) fn audio_graph(
    decoder: &decoder::Audio,
    dec_time_base: Rational,
    chain: Option<&StreamFilter>,
    enc_format: format::Sample,
    enc_layout: ChannelLayout,
    enc_rate: u32,
) -> Result<filter::Graph> {
    let args = format!(
        "time_base={}:sample_rate={}:sample_fmt={}:channel_layout=0x{:x}",
        dec_time_base,
        decoder.rate(),
        decoder.format().name(),
        decoder.channel_layout().bits(),
    );

    let chain = chain.map(|f| f.0.as_str()).unwrap_or("anull");
    let mut graph = graph_with("abuffer", &args, "abuffersink")?;

    {
        let mut sink = graph
            .get("out")
            .ok_or_else(|| Error::FilterSetupFailed("abuffersink missing".to_string()))?;
        sink.set_sample_format(enc_format);
        sink.set_channel_layout(enc_layout);
        sink.set_sample_rate(enc_rate);
    }

    parse_and_validate(&mut graph, chain)?;
    Ok(graph)
}

/**
    Build the graph for a transcoded video stream.
*/
pub(crate) fn video_graph(
    decoder: &decoder::Video,
    dec_time_base: Rational,
    chain: Option<&StreamFilter>,
    enc_format: format::Pixel,
) -> Result<filter::Graph> {
    let pix_fmt = decoder
        .format()
        .descriptor()
        .map(|d| d.name())
        .ok_or_else(|| Error::FilterSetupFailed("unknown decoder pixel format".to_string()))?;

    let aspect = decoder.aspect_ratio();
    let args = format!(
        "video_size={}x{}:pix_fmt={}:time_base={}/{}:pixel_aspect={}/{}",
        decoder.width(),
        decoder.height(),
        pix_fmt,
        dec_time_base.numerator(),
        dec_time_base.denominator(),
        aspect.numerator().max(0),
        aspect.denominator().max(1),
    );

    let chain = chain.map(|f| f.0.as_str()).unwrap_or("null");
    let mut graph = graph_with("buffer", &args, "buffersink")?;

    {
        let mut sink = graph
            .get("out")
            .ok_or_else(|| Error::FilterSetupFailed("buffersink missing".to_string()))?;
        sink.set_pixel_format(enc_format);
    }

    parse_and_validate(&mut graph, chain)?;
    Ok(graph)
}
